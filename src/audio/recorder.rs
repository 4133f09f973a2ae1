//! Single-capture recording lifecycle for speaking practice.
//!
//! [`Recorder`] owns at most one live microphone capture at a time:
//!
//! ```text
//! start() ── cpal callback ──▶ AudioChunk (mpsc) ──▶ capture-drain thread
//!                                  mix_to_mono → resample_to_16k
//!                                        └──▶ CaptureBuffer (head-keeping)
//! stop()  ── release stream → join drain → AudioQuality → AudioClip
//! cancel() ─ release stream → discard samples
//! ```
//!
//! Normalization happens on the drain thread so the cpal callback never
//! allocates more than the chunk copy.  `stop()` always releases the device
//! stream before anything that can fail, so a rejected or un-encodable
//! recording never leaves the microphone held open.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::audio::{
    mix_to_mono, resample_to_16k, AudioCapture, AudioChunk, AudioClip, AudioQuality,
    CaptureBuffer, CaptureError, StreamHandle,
};
use crate::config::AudioConfig;

// ---------------------------------------------------------------------------
// ActiveCapture
// ---------------------------------------------------------------------------

/// Everything owned for the duration of one live recording.
struct ActiveCapture {
    /// Keeps the cpal stream alive; dropped first on stop/cancel.
    handle: StreamHandle,
    /// Normalized 16 kHz mono samples, fed by the drain thread.
    buffer: Arc<Mutex<CaptureBuffer>>,
    /// Drain thread; exits once the stream (and its sender) is dropped.
    drain: JoinHandle<()>,
    started_at: Instant,
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Stateful microphone recorder producing upload-ready [`AudioClip`]s.
///
/// # Example
///
/// ```rust,no_run
/// use vocatalk::audio::Recorder;
/// use vocatalk::config::AudioConfig;
///
/// let mut recorder = Recorder::new(AudioConfig::default());
/// recorder.start().unwrap();
/// // … learner speaks …
/// let clip = recorder.stop().unwrap();
/// println!("captured {} ms", clip.duration_ms);
/// ```
pub struct Recorder {
    config: AudioConfig,
    active: Option<ActiveCapture>,
}

impl Recorder {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Whether a capture is currently live.
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Begin capturing from the default input device.
    ///
    /// Calling `start` while a recording is already live is a no-op — the
    /// running capture continues untouched.  One recording at a time.
    ///
    /// # Errors
    ///
    /// Device acquisition and stream setup errors propagate as
    /// [`CaptureError`]; no recording is live after a failed start.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.active.is_some() {
            log::debug!("start ignored: recording already in progress");
            return Ok(());
        }

        let capture = AudioCapture::new()?;
        let channels = capture.channels();
        let native_rate = capture.sample_rate();

        let max_samples =
            (self.config.max_recording_secs * self.config.sample_rate as f32).ceil() as usize;
        let buffer = Arc::new(Mutex::new(CaptureBuffer::new(max_samples.max(1))));

        let (chunk_tx, chunk_rx) = mpsc::channel::<AudioChunk>();

        // Drain cpal chunks → downmix → resample → buffer.  The thread ends
        // when the stream handle (and with it the sender) is dropped.
        let drain_buffer = Arc::clone(&buffer);
        let drain = std::thread::Builder::new()
            .name("capture-drain".into())
            .spawn(move || {
                while let Ok(chunk) = chunk_rx.recv() {
                    let mono = if channels > 1 {
                        mix_to_mono(&chunk.samples, channels)
                    } else {
                        chunk.samples
                    };

                    let normalized = if chunk.sample_rate != 16_000 {
                        resample_to_16k(&mono, chunk.sample_rate)
                    } else {
                        mono
                    };

                    drain_buffer.lock().unwrap().push_slice(&normalized);
                }
            })?;

        let handle = capture.start(chunk_tx)?;

        log::info!("recording started ({native_rate} Hz, {channels} ch)");
        self.active = Some(ActiveCapture {
            handle,
            buffer,
            drain,
            started_at: Instant::now(),
        });
        Ok(())
    }

    /// Stop capturing and finalize the recording into an [`AudioClip`].
    ///
    /// The device stream is released first, unconditionally — quality
    /// rejection or encoding failure never leaves the microphone open.
    ///
    /// # Errors
    ///
    /// * [`CaptureError::NotRecording`] when no capture is live.
    /// * [`CaptureError::Rejected`] when the recording fails the
    ///   [`AudioQuality`] checks (too short, too quiet).
    /// * [`CaptureError::Encode`] when WAV serialization fails.
    pub fn stop(&mut self) -> Result<AudioClip, CaptureError> {
        let active = self.active.take().ok_or(CaptureError::NotRecording)?;
        let (samples, truncated) = Self::release(active);

        if truncated {
            log::warn!(
                "recording hit the {}s cap, tail discarded",
                self.config.max_recording_secs
            );
        }

        AudioQuality::from_config(&self.config).validate(&samples)?;

        let clip = AudioClip::from_pcm(&samples, self.config.sample_rate)?;
        log::info!(
            "recording finalized: {} ms, {} bytes",
            clip.duration_ms,
            clip.byte_len()
        );
        Ok(clip)
    }

    /// Abort the current capture and discard everything recorded so far.
    ///
    /// No-op when nothing is recording.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            let elapsed = active.started_at.elapsed();
            let (samples, _) = Self::release(active);
            log::debug!(
                "recording cancelled after {:.1}s, {} samples discarded",
                elapsed.as_secs_f32(),
                samples.len()
            );
        }
    }

    /// Tear down a live capture: stop the stream, join the drain thread,
    /// drain the buffer.
    fn release(active: ActiveCapture) -> (Vec<f32>, bool) {
        // Dropping the handle stops the stream and closes the chunk sender,
        // which lets the drain thread run to completion.
        drop(active.handle);
        if active.drain.join().is_err() {
            log::error!("capture drain thread panicked; keeping what was buffered");
        }
        active.buffer.lock().unwrap().finalize()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Live-device paths need real hardware; CI-safe tests cover the lifecycle
// contract around an idle recorder.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_recorder_is_idle() {
        let recorder = Recorder::new(AudioConfig::default());
        assert!(!recorder.is_recording());
    }

    #[test]
    fn stop_without_start_is_not_recording() {
        let mut recorder = Recorder::new(AudioConfig::default());
        let err = recorder.stop().unwrap_err();
        assert!(matches!(err, CaptureError::NotRecording), "{err}");
    }

    #[test]
    fn cancel_without_start_is_a_noop() {
        let mut recorder = Recorder::new(AudioConfig::default());
        recorder.cancel();
        assert!(!recorder.is_recording());
    }
}
