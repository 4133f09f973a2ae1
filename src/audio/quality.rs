//! Pre-upload recording validation.
//!
//! A finished recording is checked against the configured duration window
//! and silence floor before any bytes leave the device.  Catching a bad
//! take locally spares the learner a pointless upload round trip and lets
//! the UI name the actual problem (too short, too long, nothing audible)
//! instead of a generic transcription failure.
//!
//! # Example
//!
//! ```rust
//! use vocatalk::audio::{AudioQuality, AudioError};
//!
//! let checker = AudioQuality::new(1.0, 30.0);
//!
//! // a second and a half of steady signal at 16 kHz
//! let answer = vec![0.2_f32; 24_000];
//! assert!(checker.validate(&answer).is_ok());
//!
//! // a fraction of a second gets rejected
//! let blip = vec![0.2_f32; 640];
//! assert!(matches!(checker.validate(&blip), Err(AudioError::TooShort { .. })));
//! ```

use thiserror::Error;

use crate::config::AudioConfig;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Reason a recording was rejected before upload.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioError {
    /// The take ended before the minimum duration.
    #[error("recording lasted {got_secs:.2}s, need at least {min_secs:.2}s")]
    TooShort { min_secs: f32, got_secs: f32 },

    /// The take ran past the maximum duration.
    #[error("recording lasted {got_secs:.2}s, at most {max_secs:.2}s allowed")]
    TooLong { max_secs: f32, got_secs: f32 },

    /// No sample reached the silence floor.
    #[error("nothing audible: peak {amplitude:.4} below floor {threshold:.4}")]
    TooQuiet { amplitude: f32, threshold: f32 },
}

// ---------------------------------------------------------------------------
// AudioQuality
// ---------------------------------------------------------------------------

/// Duration-window and silence-floor validator for finished recordings.
///
/// `Default` mirrors the product defaults in [`AudioConfig`].
pub struct AudioQuality {
    /// Shortest acceptable recording in seconds (default `0.5`).
    pub min_recording_secs: f32,
    /// Longest acceptable recording in seconds (default `60.0`).
    pub max_recording_secs: f32,
    /// Peak amplitude a recording must reach to count as speech
    /// (default `0.01`).
    pub silence_threshold: f32,
}

impl Default for AudioQuality {
    fn default() -> Self {
        Self {
            min_recording_secs: 0.5,
            max_recording_secs: 60.0,
            silence_threshold: 0.01,
        }
    }
}

impl AudioQuality {
    /// Validator with the given duration window and the default silence
    /// floor.
    pub fn new(min_secs: f32, max_secs: f32) -> Self {
        Self {
            min_recording_secs: min_secs,
            max_recording_secs: max_secs,
            ..Default::default()
        }
    }

    /// Validator taken straight from the persisted audio settings.
    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            min_recording_secs: config.min_recording_secs,
            max_recording_secs: config.max_recording_secs,
            silence_threshold: config.silence_threshold,
        }
    }

    /// Check `audio` (16 kHz mono) and return the first violation found:
    /// duration window first, then the silence floor.
    pub fn validate(&self, audio: &[f32]) -> Result<(), AudioError> {
        const UPLOAD_RATE: f32 = 16_000.0;

        let got_secs = audio.len() as f32 / UPLOAD_RATE;
        if got_secs < self.min_recording_secs {
            return Err(AudioError::TooShort {
                min_secs: self.min_recording_secs,
                got_secs,
            });
        }
        if got_secs > self.max_recording_secs {
            return Err(AudioError::TooLong {
                max_secs: self.max_recording_secs,
                got_secs,
            });
        }

        let peak = audio.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        if peak < self.silence_threshold {
            return Err(AudioError::TooQuiet {
                amplitude: peak,
                threshold: self.silence_threshold,
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Constant-level PCM standing in for `secs` of speech at 16 kHz.
    fn take(secs: f32, peak: f32) -> Vec<f32> {
        vec![peak; (secs * 16_000.0) as usize]
    }

    #[test]
    fn ordinary_answer_passes() {
        let checker = AudioQuality::default();
        assert!(checker.validate(&take(2.0, 0.4)).is_ok());
    }

    #[test]
    fn tapping_the_button_is_too_short() {
        let checker = AudioQuality::default();
        let verdict = checker.validate(&take(0.2, 0.4));
        assert!(matches!(verdict, Err(AudioError::TooShort { .. })));
    }

    #[test]
    fn exactly_the_minimum_is_accepted() {
        let checker = AudioQuality::new(1.0, 30.0);
        assert!(checker.validate(&take(1.0, 0.4)).is_ok());
    }

    #[test]
    fn rambling_past_the_window_is_too_long() {
        let checker = AudioQuality::new(0.5, 15.0);
        let verdict = checker.validate(&take(16.0, 0.4));
        assert!(matches!(verdict, Err(AudioError::TooLong { .. })));
    }

    #[test]
    fn dead_air_is_too_quiet() {
        let checker = AudioQuality::default();
        let verdict = checker.validate(&take(2.0, 0.0));
        assert!(matches!(verdict, Err(AudioError::TooQuiet { .. })));
    }

    #[test]
    fn whisper_below_the_floor_is_rejected() {
        let mut checker = AudioQuality::default();
        checker.silence_threshold = 0.04;
        assert!(matches!(
            checker.validate(&take(2.0, 0.02)).unwrap_err(),
            AudioError::TooQuiet { .. }
        ));
    }

    #[test]
    fn peak_equal_to_the_floor_counts_as_speech() {
        let mut checker = AudioQuality::default();
        checker.silence_threshold = 0.06;
        assert!(checker.validate(&take(2.0, 0.06)).is_ok());
    }

    #[test]
    fn duration_is_judged_before_silence() {
        // A short silent take must report the duration problem, the one the
        // learner can actually fix first.
        let checker = AudioQuality::default();
        assert!(matches!(
            checker.validate(&take(0.1, 0.0)).unwrap_err(),
            AudioError::TooShort { .. }
        ));
    }

    #[test]
    fn from_config_copies_every_threshold() {
        let config = AudioConfig {
            sample_rate: 16_000,
            min_recording_secs: 1.5,
            max_recording_secs: 20.0,
            silence_threshold: 0.02,
        };
        let checker = AudioQuality::from_config(&config);

        assert!(matches!(
            checker.validate(&take(1.0, 0.3)).unwrap_err(),
            AudioError::TooShort { .. }
        ));
        assert!(matches!(
            checker.validate(&take(21.0, 0.3)).unwrap_err(),
            AudioError::TooLong { .. }
        ));
        assert!(matches!(
            checker.validate(&take(2.0, 0.01)).unwrap_err(),
            AudioError::TooQuiet { .. }
        ));
        assert!(checker.validate(&take(2.0, 0.3)).is_ok());
    }

    #[test]
    fn rejections_name_both_sides_of_the_bound() {
        let err = AudioError::TooShort {
            min_secs: 1.0,
            got_secs: 0.25,
        };
        let text = err.to_string();
        assert!(text.contains("0.25"), "message: {text}");
        assert!(text.contains("1.00"), "message: {text}");
    }
}
