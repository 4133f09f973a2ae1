//! Core `Backend` trait and the `HttpBackend` implementation.
//!
//! `HttpBackend` speaks the session REST API: session creation, chat and
//! speaking turns, and the multipart audio upload for server-side
//! transcription.  All connection details come from [`ApiConfig`]; nothing
//! is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::AudioClip;
use crate::config::ApiConfig;
use crate::session::SessionMode;

use super::types::{SessionCreateResponse, TranscribeResponse, TurnResponse};

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the session backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The daily free quota is exhausted (HTTP 429).
    #[error("free limit reached: {detail}")]
    QuotaExceeded { detail: String },

    /// A premium subscription is required or has expired (HTTP 403).
    #[error("subscription required: {detail}")]
    NotEntitled { detail: String },

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("backend request timed out")]
    Timeout,

    /// Any other non-success status.
    #[error("backend returned status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The response body could not be parsed as expected JSON.
    #[error("failed to parse backend response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

impl ApiError {
    /// `true` for rejections that should route the learner to the subscribe
    /// surface instead of showing an apology.
    pub fn is_upsell(&self) -> bool {
        matches!(
            self,
            ApiError::QuotaExceeded { .. } | ApiError::NotEntitled { .. }
        )
    }
}

/// Pull the human-readable detail out of an error body.
///
/// The backend returns either `{"detail": "plain text"}` (quota) or
/// `{"detail": {"code": …, "message": …, "action": …}}` (entitlement);
/// anything else falls back to the trimmed raw body.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            let detail = &json["detail"];
            if let Some(text) = detail.as_str() {
                text.to_string()
            } else if let Some(message) = detail["message"].as_str() {
                message.to_string()
            } else {
                body.trim().to_string()
            }
        }
        Err(_) => body.trim().to_string(),
    }
}

/// Map a non-success response to the matching [`ApiError`].
fn error_for_status(status: u16, body: &str) -> ApiError {
    let detail = error_detail(body);
    match status {
        429 => ApiError::QuotaExceeded { detail },
        403 => ApiError::NotEntitled { detail },
        _ => ApiError::Status { status, detail },
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Async trait for the session backend.
///
/// Implementors must be `Send + Sync` so they can be shared across threads
/// (e.g. wrapped in `Arc<dyn Backend>`).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create a session practising `word_ids` and return its opening state.
    async fn create_session(
        &self,
        mode: SessionMode,
        word_ids: &[String],
    ) -> Result<SessionCreateResponse, ApiError>;

    /// Send one typed learner turn.
    async fn send_chat_turn(
        &self,
        session_id: &str,
        content: &str,
    ) -> Result<TurnResponse, ApiError>;

    /// Send one spoken learner turn whose text is already final
    /// (client-side recognition fallback).
    async fn send_speaking_turn(
        &self,
        session_id: &str,
        transcript: &str,
        audio_duration_ms: u64,
    ) -> Result<TurnResponse, ApiError>;

    /// Upload a recorded clip for server-side transcription and get the
    /// whole turn back.
    async fn transcribe_turn(
        &self,
        session_id: &str,
        clip: &AudioClip,
    ) -> Result<TranscribeResponse, ApiError>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// Talks to the real session API over HTTPS.
///
/// # No hardcoded URLs
/// All connection details (`base_url`, `auth_token`, `timeout_secs`) come
/// exclusively from the [`ApiConfig`] passed to
/// [`HttpBackend::from_config`].
pub struct HttpBackend {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpBackend {
    /// Build an `HttpBackend` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Attach the `Authorization: Bearer …` header **only** when
    /// `config.auth_token` is `Some(token)` and `token` is non-empty — safe
    /// for local development backends that require no authentication.
    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self.config.auth_token.as_deref().unwrap_or("");
        if token.is_empty() {
            req
        } else {
            req.bearer_auth(token)
        }
    }

    /// Check the status and decode the success body, mapping failures to
    /// the right [`ApiError`] variant.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), &body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_session(
        &self,
        mode: SessionMode,
        word_ids: &[String],
    ) -> Result<SessionCreateResponse, ApiError> {
        let body = serde_json::json!({
            "mode":     mode,
            "word_ids": word_ids,
        });

        let req = self
            .authorize(self.client.post(self.endpoint("/chat/session")).json(&body));
        let response = req.send().await?;
        Self::read_json(response).await
    }

    async fn send_chat_turn(
        &self,
        session_id: &str,
        content: &str,
    ) -> Result<TurnResponse, ApiError> {
        let body = serde_json::json!({
            "session_id": session_id,
            "content":    content,
        });

        let req = self
            .authorize(self.client.post(self.endpoint("/chat/message")).json(&body));
        let response = req.send().await?;
        Self::read_json(response).await
    }

    async fn send_speaking_turn(
        &self,
        session_id: &str,
        transcript: &str,
        audio_duration_ms: u64,
    ) -> Result<TurnResponse, ApiError> {
        let body = serde_json::json!({
            "session_id":        session_id,
            "transcribed_text":  transcript,
            "audio_duration_ms": audio_duration_ms,
        });

        let req = self.authorize(
            self.client
                .post(self.endpoint("/speaking/message"))
                .json(&body),
        );
        let response = req.send().await?;
        Self::read_json(response).await
    }

    async fn transcribe_turn(
        &self,
        session_id: &str,
        clip: &AudioClip,
    ) -> Result<TranscribeResponse, ApiError> {
        let part = reqwest::multipart::Part::bytes(clip.data.clone())
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("audio", part)
            .text("session_id", session_id.to_string());

        let req = self.authorize(
            self.client
                .post(self.endpoint("/speaking/transcribe"))
                .multipart(form),
        );
        let response = req.send().await?;
        Self::read_json(response).await
    }
}

// ---------------------------------------------------------------------------
// MockBackend  (test double)
// ---------------------------------------------------------------------------

#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Mutex;

/// Scripted backend for tests: responses are queued per endpoint and every
/// call is counted, so tests can assert both the path taken and that gated
/// paths made **zero** network calls.
#[cfg(test)]
pub struct MockBackend {
    create_results: Mutex<VecDeque<Result<SessionCreateResponse, ApiError>>>,
    chat_results: Mutex<VecDeque<Result<TurnResponse, ApiError>>>,
    speaking_results: Mutex<VecDeque<Result<TurnResponse, ApiError>>>,
    transcribe_results: Mutex<VecDeque<Result<TranscribeResponse, ApiError>>>,
    pub create_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub speaking_calls: AtomicUsize,
    pub transcribe_calls: AtomicUsize,
}

#[cfg(test)]
impl MockBackend {
    pub fn new() -> Self {
        Self {
            create_results: Mutex::new(VecDeque::new()),
            chat_results: Mutex::new(VecDeque::new()),
            speaking_results: Mutex::new(VecDeque::new()),
            transcribe_results: Mutex::new(VecDeque::new()),
            create_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            speaking_calls: AtomicUsize::new(0),
            transcribe_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_create(&self, result: Result<SessionCreateResponse, ApiError>) {
        self.create_results.lock().unwrap().push_back(result);
    }

    pub fn push_chat(&self, result: Result<TurnResponse, ApiError>) {
        self.chat_results.lock().unwrap().push_back(result);
    }

    pub fn push_speaking(&self, result: Result<TurnResponse, ApiError>) {
        self.speaking_results.lock().unwrap().push_back(result);
    }

    pub fn push_transcribe(&self, result: Result<TranscribeResponse, ApiError>) {
        self.transcribe_results.lock().unwrap().push_back(result);
    }
}

#[cfg(test)]
#[async_trait]
impl Backend for MockBackend {
    async fn create_session(
        &self,
        _mode: SessionMode,
        _word_ids: &[String],
    ) -> Result<SessionCreateResponse, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Request("no scripted create response".into())))
    }

    async fn send_chat_turn(
        &self,
        _session_id: &str,
        _content: &str,
    ) -> Result<TurnResponse, ApiError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.chat_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Request("no scripted chat response".into())))
    }

    async fn send_speaking_turn(
        &self,
        _session_id: &str,
        _transcript: &str,
        _audio_duration_ms: u64,
    ) -> Result<TurnResponse, ApiError> {
        self.speaking_calls.fetch_add(1, Ordering::SeqCst);
        self.speaking_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Request("no scripted speaking response".into())))
    }

    async fn transcribe_turn(
        &self,
        _session_id: &str,
        _clip: &AudioClip,
    ) -> Result<TranscribeResponse, ApiError> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        self.transcribe_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Request("no scripted transcribe response".into())))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(auth_token: Option<&str>) -> ApiConfig {
        ApiConfig {
            base_url: "http://localhost:8000/api".into(),
            auth_token: auth_token.map(|s| s.to_string()),
            timeout_secs: 30,
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let config = make_config(None);
        let _backend = HttpBackend::from_config(&config);
    }

    #[test]
    fn from_config_accepts_empty_token() {
        let config = make_config(Some(""));
        let _backend = HttpBackend::from_config(&config);
    }

    /// Verify that `HttpBackend` is object-safe (usable as `dyn Backend`).
    #[test]
    fn backend_is_object_safe() {
        let config = make_config(None);
        let backend: Box<dyn Backend> = Box::new(HttpBackend::from_config(&config));
        drop(backend);
    }

    #[test]
    fn endpoint_joins_base_url() {
        let backend = HttpBackend::from_config(&make_config(None));
        assert_eq!(
            backend.endpoint("/chat/session"),
            "http://localhost:8000/api/chat/session"
        );
    }

    // ---- error mapping -----------------------------------------------------

    #[test]
    fn error_detail_reads_plain_string() {
        let body = r#"{"detail": "Daily free session limit reached (3/3)."}"#;
        assert_eq!(error_detail(body), "Daily free session limit reached (3/3).");
    }

    #[test]
    fn error_detail_reads_structured_message() {
        let body = r#"{"detail": {"code": "PREMIUM_REQUIRED", "message": "Speaking mode requires a premium subscription.", "action": "REDIRECT_SUBSCRIBE"}}"#;
        assert_eq!(
            error_detail(body),
            "Speaking mode requires a premium subscription."
        );
    }

    #[test]
    fn error_detail_falls_back_to_raw_body() {
        assert_eq!(error_detail("gateway exploded"), "gateway exploded");
        assert_eq!(error_detail("  spaced  "), "spaced");
    }

    #[test]
    fn status_429_maps_to_quota() {
        let err = error_for_status(429, r#"{"detail": "limit reached"}"#);
        assert!(matches!(err, ApiError::QuotaExceeded { ref detail } if detail == "limit reached"));
        assert!(err.is_upsell());
    }

    #[test]
    fn status_403_maps_to_entitlement() {
        let err = error_for_status(403, r#"{"detail": {"message": "premium only"}}"#);
        assert!(matches!(err, ApiError::NotEntitled { ref detail } if detail == "premium only"));
        assert!(err.is_upsell());
    }

    #[test]
    fn other_statuses_keep_their_code() {
        let err = error_for_status(500, "oops");
        match err {
            ApiError::Status { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "oops");
            }
            other => panic!("expected Status, got {other:?}"),
        }
        assert!(!error_for_status(500, "oops").is_upsell());
    }

    // ---- mock --------------------------------------------------------------

    /// The mock must fail loudly (not panic) when a test forgets to script
    /// a response.
    #[tokio::test]
    async fn mock_without_script_returns_error() {
        let mock = MockBackend::new();
        let result = mock.send_chat_turn("sess-1", "hello").await;
        assert!(matches!(result, Err(ApiError::Request(_))));
        assert_eq!(mock.chat_calls.load(Ordering::SeqCst), 1);
    }
}
