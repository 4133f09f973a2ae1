//! Settings structs, their product defaults, and the TOML round trip.
//!
//! Every struct here derives `Serialize`, `Deserialize`, `Clone` and
//! `Default`, and a freshly-defaulted [`AppConfig`] is a complete working
//! configuration — first launch needs no settings file at all.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Connection settings for the session backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API (no trailing slash).
    ///
    /// Endpoints are appended verbatim, e.g. `{base_url}/chat/session`.
    pub base_url: String,
    /// Bearer token — `None` for anonymous / local development backends.
    pub auth_token: Option<String>,
    /// Maximum seconds to wait for a backend response before timing out.
    ///
    /// Speaking turns carry an audio upload, so this covers the whole
    /// transcribe-and-reply round trip.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".into(),
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for microphone capture and pre-upload validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz that clips are normalised to before upload
    /// (the transcription service expects 16 000).
    pub sample_rate: u32,
    /// Minimum recording length in seconds before an upload is attempted.
    pub min_recording_secs: f32,
    /// Maximum recording length in seconds; capture past this point is
    /// discarded and the clip is flagged as truncated.
    pub max_recording_secs: f32,
    /// Peak amplitude below which a recording is treated as silence and
    /// rejected without uploading.
    pub silence_threshold: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            min_recording_secs: 0.5,
            max_recording_secs: 60.0,
            silence_threshold: 0.01,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for spoken tutor replies (text-to-speech).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Whether tutor replies are spoken aloud at all.
    pub enabled: bool,
    /// Platform voice name — `None` means the system default voice.
    pub voice: Option<String>,
    /// Speaking rate multiplier; 1.0 is the platform's normal rate.
    /// Slightly slowed by default so learners can follow.
    pub rate: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            voice: None,
            rate: 0.9,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timing knobs for the session flow.
///
/// | Field | Meaning |
/// |-------|---------|
/// | `chat_redirect_delay_ms`     | Pause before the results handoff in chat mode |
/// | `speaking_redirect_delay_ms` | Pause before the results handoff in speaking mode |
/// | `toast_dedup_ms`             | Window in which an identical toast is suppressed |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Milliseconds between a completed chat turn and the results handoff,
    /// so the learner can read the tutor's closing message.
    pub chat_redirect_delay_ms: u64,
    /// Milliseconds between a completed speaking turn and the results
    /// handoff (shorter — the closing message is also spoken aloud).
    pub speaking_redirect_delay_ms: u64,
    /// Milliseconds within which a repeated identical toast is dropped.
    pub toast_dedup_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chat_redirect_delay_ms: 3_000,
            speaking_redirect_delay_ms: 2_000,
            toast_dedup_ms: 1_000,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// The whole configuration tree, persisted as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use vocatalk::config::AppConfig;
///
/// let mut config = AppConfig::load().unwrap(); // defaults when no file yet
/// config.speech.enabled = false;
/// config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend connection settings.
    pub api: ApiConfig,
    /// Microphone capture / validation settings.
    pub audio: AudioConfig,
    /// Spoken-reply settings.
    pub speech: SpeechConfig,
    /// Session flow timing.
    pub session: SessionConfig,
}

impl AppConfig {
    /// Read `settings.toml` from the platform config directory.
    ///
    /// A missing file is not an error: the defaults come back instead, so
    /// the first launch needs no setup step.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Read settings from an explicit `path`; seam for tests.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
    }

    /// Write `settings.toml` to the platform config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Write settings to an explicit `path`, creating missing parent
    /// directories; seam for tests.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// True while no settings file has been written yet; `main` uses this
    /// to seed one on first launch.
    pub fn is_first_run() -> bool {
        !AppPaths::new().settings_file.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
