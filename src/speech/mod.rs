//! Spoken tutor replies — the text-to-speech seam.
//!
//! # Overview
//!
//! [`SpeechSynthesizer`] is the interface the speaking controller talks to.
//! The real voice lives in the platform shell (system TTS, web speech, a
//! cloud voice); this crate only decides *when* to speak.
//!
//! [`SilentSynthesizer`] is the built-in no-voice implementation.
//!
//! [`MockSynthesizer`] (available under `#[cfg(test)]`) records utterances
//! so tests can assert what would have been spoken.

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// All errors that can arise from spoken output.
///
/// Speech is best-effort everywhere in the engine: callers log these and
/// carry on, a silent turn is still a valid turn.
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// No voice backend is available on this platform / shell.
    #[error("speech output unavailable: {0}")]
    Unavailable(String),

    /// The voice backend failed mid-utterance.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for spoken output.
///
/// Implementations must be `Send + Sync` so they can be held behind an
/// `Arc<dyn SpeechSynthesizer>` and called from any thread.
///
/// # Contract
///
/// Starting a new utterance interrupts any utterance still playing — the
/// tutor never talks over itself.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` aloud.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

// Compile-time assertion: Box<dyn SpeechSynthesizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>) {}
};

// ---------------------------------------------------------------------------
// SilentSynthesizer
// ---------------------------------------------------------------------------

/// Discards every utterance.  Used when speech is disabled in config or the
/// shell has no voice backend wired up.
pub struct SilentSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        log::debug!("speech muted: {text}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// Test double that records every utterance in order.
#[cfg(test)]
pub struct MockSynthesizer {
    spoken: std::sync::Mutex<Vec<String>>,
    fail: bool,
}

#[cfg(test)]
impl MockSynthesizer {
    /// Mock that accepts and records every utterance.
    pub fn new() -> Self {
        Self {
            spoken: std::sync::Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Mock whose `speak` always fails (still records the attempt).
    pub fn failing() -> Self {
        Self {
            spoken: std::sync::Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Everything spoken so far, oldest first.
    pub fn utterances(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            Err(SpeechError::Synthesis("scripted failure".into()))
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
