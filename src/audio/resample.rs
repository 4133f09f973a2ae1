//! Channel downmix and sample-rate conversion.
//!
//! Recordings are uploaded as **16 kHz mono** WAV regardless of what the
//! device natively produces.  This module provides the two normalization
//! steps the drain thread applies to every chunk:
//!
//! 1. [`mix_to_mono`] — downmix any number of interleaved channels to mono.
//! 2. [`resample_to_16k`] — convert from the device rate to 16 kHz.
//!
//! The resampler uses linear interpolation, which is plenty for speech that
//! only needs to survive a transcription pass.

// ---------------------------------------------------------------------------
// mix_to_mono
// ---------------------------------------------------------------------------

/// Downmix interleaved `samples` with `channels` channels into mono by
/// averaging each frame.
///
/// Mono input is returned as-is; `channels == 0` yields an empty vector.
/// A trailing partial frame (fewer samples than channels) is dropped.
///
/// # Example
///
/// ```rust
/// use vocatalk::audio::mix_to_mono;
///
/// // Interleaved L/R: two frames
/// let stereo = [0.2_f32, 0.4, -0.6, 0.6];
/// let mono = mix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.3).abs() < 1e-6);
/// assert!((mono[1] - 0.0).abs() < 1e-6);
/// ```
pub fn mix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels == 0 {
        return Vec::new();
    }
    if channels == 1 {
        return samples.to_vec();
    }

    let frame = channels as usize;
    let mut mono = Vec::with_capacity(samples.len() / frame);
    for chunk in samples.chunks_exact(frame) {
        mono.push(chunk.iter().sum::<f32>() / frame as f32);
    }
    mono
}

// ---------------------------------------------------------------------------
// resample_to_16k
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to 16 000 Hz by linear
/// interpolation.
///
/// Input already at 16 kHz (or empty input) is returned unchanged.  Output
/// positions past the final input sample clamp to it, so the tail carries no
/// synthetic silence.  The output holds roughly
/// `samples.len() * 16_000 / source_rate` samples.
///
/// # Example
///
/// ```rust
/// use vocatalk::audio::resample_to_16k;
///
/// // 30 ms at 48 kHz becomes 30 ms at 16 kHz
/// let device = vec![0.25_f32; 1_440];
/// let upload = resample_to_16k(&device, 48_000);
/// assert_eq!(upload.len(), 480);
/// ```
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    const TARGET_RATE: u32 = 16_000;

    if source_rate == TARGET_RATE || samples.is_empty() {
        return samples.to_vec();
    }

    // Distance in input samples between consecutive output samples.
    let step = source_rate as f64 / TARGET_RATE as f64;
    let output_len = (samples.len() as f64 / step).ceil() as usize;
    let last = samples.len() - 1;

    let mut output = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let pos = i as f64 * step;
        let left = (pos as usize).min(last);
        let right = (left + 1).min(last);
        let frac = (pos - left as f64) as f32;
        output.push(samples[left] + (samples[right] - samples[left]) * frac);
    }
    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
