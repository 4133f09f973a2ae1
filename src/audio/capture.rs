//! Talking to the microphone through `cpal`.
//!
//! [`AudioCapture`] binds the default input device; [`AudioCapture::start`]
//! begins streaming [`AudioChunk`]s over an mpsc channel and returns a RAII
//! [`StreamHandle`] whose drop stops the hardware stream.
//!
//! The higher-level [`Recorder`](crate::audio::Recorder) owns this lifecycle
//! for the speaking practice flow; use this type directly only when you need
//! raw chunks.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

use crate::audio::AudioError;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// One callback's worth of raw audio, straight off the device.
///
/// Samples are interleaved `f32` in the range `[-1.0, 1.0]` at whatever rate
/// and channel count the device natively produces.  Use
/// [`crate::audio::mix_to_mono`] and [`crate::audio::resample_to_16k`] to
/// normalize before encoding a clip for upload.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM, each sample in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Rate in Hz the samples were captured at.
    pub sample_rate: u32,
    /// Interleaved channel count (1 = mono, 2 = stereo, …).
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// Owns the live input stream for the duration of a recording.
///
/// Dropping it stops the hardware stream and releases the microphone; the
/// capture callback (and with it the chunk sender) goes away at the same
/// time, which is how the drain thread learns the recording ended.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        log::debug!("microphone stream released");
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors from the capture unit — device setup, recorder lifecycle, and clip
/// finalization share this one domain.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No usable input device.  Covers both missing hardware and the OS
    /// refusing microphone access (cpal cannot tell the two apart).
    #[error("microphone unavailable: access denied or no input device")]
    PermissionDenied,

    #[error("input device reported no default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("could not build the input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("could not start the input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to spawn capture drain thread: {0}")]
    Thread(#[from] std::io::Error),

    /// `stop()` was called with no recording in progress.
    #[error("no recording in progress")]
    NotRecording,

    /// The finished recording failed quality validation (too short, silent).
    #[error(transparent)]
    Rejected(#[from] AudioError),

    #[error("failed to encode wav clip: {0}")]
    Encode(#[from] hound::Error),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// The default input device together with its negotiated stream config.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use vocatalk::audio::{AudioCapture, AudioChunk};
///
/// let (tx, rx) = mpsc::channel::<AudioChunk>();
/// let mic = AudioCapture::new().unwrap();
/// let stream = mic.start(tx).unwrap();
/// // recording runs until `stream` is dropped
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl AudioCapture {
    /// Bind the system default input device with its preferred stream
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::PermissionDenied`] when no input device is
    /// available, or [`CaptureError::DefaultConfig`] when the device cannot
    /// report a default stream configuration.
    pub fn new() -> Result<Self, CaptureError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::PermissionDenied)?;
        let supported = device.default_input_config()?;

        log::debug!(
            "capture device {:?}: {} ch @ {} Hz",
            device.name().unwrap_or_else(|_| "unnamed".into()),
            supported.channels(),
            supported.sample_rate().0
        );

        Ok(Self {
            config: supported.into(),
            device,
        })
    }

    /// Open the stream and forward every hardware buffer to `tx` as one
    /// [`AudioChunk`].
    ///
    /// The cpal callback runs on a dedicated audio thread.  A closed
    /// receiver just means the recording was stopped, so send errors are
    /// ignored rather than surfaced into that thread.
    ///
    /// # Errors
    ///
    /// [`CaptureError::BuildStream`] / [`CaptureError::PlayStream`] when the
    /// platform rejects the stream configuration.
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, CaptureError> {
        let sample_rate = self.sample_rate();
        let channels = self.channels();

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if data.is_empty() {
                    return;
                }
                let _ = tx.send(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("microphone stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Rate the device delivers at, commonly 44 100 or 48 000 Hz (not the
    /// 16 kHz the upload pipeline normalizes to).
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Channel count of each delivered [`AudioChunk`].
    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
