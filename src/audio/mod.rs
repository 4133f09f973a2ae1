//! Audio capture unit — microphone → normalization → bounded buffer → WAV clip.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → mix_to_mono
//!           → resample_to_16k → CaptureBuffer → AudioQuality → AudioClip
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vocatalk::audio::Recorder;
//! use vocatalk::config::AudioConfig;
//!
//! let mut recorder = Recorder::new(AudioConfig::default());
//! recorder.start().unwrap();
//! // … learner speaks …
//! match recorder.stop() {
//!     Ok(clip) => println!("captured {} ms of audio", clip.duration_ms),
//!     Err(err) => eprintln!("recording unusable: {err}"),
//! }
//! ```

pub mod buffer;
pub mod capture;
pub mod clip;
pub mod quality;
pub mod recorder;
pub mod resample;

pub use buffer::CaptureBuffer;
pub use capture::{AudioCapture, AudioChunk, CaptureError, StreamHandle};
pub use clip::AudioClip;
pub use quality::{AudioError, AudioQuality};
pub use recorder::Recorder;
pub use resample::{mix_to_mono, resample_to_16k};
