//! Response shapes of the session backend.
//!
//! These mirror the server JSON exactly; request bodies are assembled inline
//! with `serde_json::json!` in [`super::backend`].

use serde::{Deserialize, Serialize};

use crate::session::{Message, SessionMode, SessionStatus, SessionSummary, TargetWord};

// ---------------------------------------------------------------------------
// SessionCreateResponse
// ---------------------------------------------------------------------------

/// Body of `POST /chat/session` — everything needed to seed the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCreateResponse {
    pub session_id: String,
    pub mode: SessionMode,
    pub target_words: Vec<TargetWord>,
    /// The tutor's opening message.
    pub initial_message: Message,
}

// ---------------------------------------------------------------------------
// TurnResponse
// ---------------------------------------------------------------------------

/// Body of `POST /chat/message` and `POST /speaking/message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResponse {
    /// The tutor's reply for this turn.
    pub message: Message,
    /// Authoritative progress snapshot.
    pub session_status: SessionStatus,
    /// Present only on the turn that completes the session.
    pub summary: Option<SessionSummary>,
}

// ---------------------------------------------------------------------------
// Transcription / TranscribeResponse
// ---------------------------------------------------------------------------

/// The two transcription variants the speech service returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcription {
    /// Verbatim speech-to-text output.
    pub raw: String,
    /// Cleaned-up variant (fillers stripped, punctuation restored).  May be
    /// blank when post-processing produced nothing usable.
    pub processed: String,
}

impl Transcription {
    /// The text worth showing: `processed`, or `raw` when `processed` is
    /// blank.
    pub fn best(&self) -> &str {
        if self.processed.trim().is_empty() {
            &self.raw
        } else {
            &self.processed
        }
    }
}

/// Body of `POST /speaking/transcribe` — a full turn plus the transcription
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub transcription: Transcription,
    pub message: Message,
    pub session_status: SessionStatus,
    pub summary: Option<SessionSummary>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_response_parses_backend_shape() {
        let json = r#"{
            "session_id": "sess-7",
            "mode": "chat",
            "target_words": [
                {"id": "w1", "word": "resilient", "definition": "able to recover quickly"}
            ],
            "initial_message": {"role": "assistant", "content": "Hello! Ready to practice?"}
        }"#;

        let resp: SessionCreateResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(resp.session_id, "sess-7");
        assert_eq!(resp.mode, SessionMode::Chat);
        assert_eq!(resp.target_words[0].word, "resilient");
        assert_eq!(resp.initial_message.content, "Hello! Ready to practice?");
    }

    #[test]
    fn turn_response_parses_with_extras() {
        let json = r#"{
            "message": {
                "role": "assistant",
                "content": "Nice sentence!",
                "word_usage": {"resilient": true},
                "hint": "Try 'concede' next.",
                "grammar_correction": null
            },
            "session_status": {
                "words_used": {"resilient": true, "concede": false},
                "completed_count": 1,
                "is_completed": false
            },
            "summary": null
        }"#;

        let resp: TurnResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(resp.message.hint.as_deref(), Some("Try 'concede' next."));
        assert_eq!(resp.session_status.completed_count, 1);
        assert!(resp.summary.is_none());
    }

    #[test]
    fn transcribe_response_parses_with_feedback() {
        let json = r#"{
            "transcription": {"raw": "uh i felt resilient", "processed": "I felt resilient."},
            "message": {
                "role": "assistant",
                "content": "Well done!",
                "feedback": {
                    "pronunciation": "clear",
                    "grammar": "good",
                    "vocabulary": "on target",
                    "score": 9
                }
            },
            "session_status": {"words_used": {}, "completed_count": 0, "is_completed": false},
            "summary": null
        }"#;

        let resp: TranscribeResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(resp.transcription.processed, "I felt resilient.");
        assert_eq!(resp.message.feedback.as_ref().unwrap().score, 9);
    }

    // ---- Transcription::best -----------------------------------------------

    #[test]
    fn best_prefers_processed() {
        let t = Transcription {
            raw: "uh hello there".into(),
            processed: "Hello there.".into(),
        };
        assert_eq!(t.best(), "Hello there.");
    }

    #[test]
    fn best_falls_back_to_raw_when_processed_blank() {
        let t = Transcription {
            raw: "hello there".into(),
            processed: String::new(),
        };
        assert_eq!(t.best(), "hello there");
    }

    #[test]
    fn best_treats_whitespace_as_blank() {
        let t = Transcription {
            raw: "hello".into(),
            processed: "   ".into(),
        };
        assert_eq!(t.best(), "hello");
    }
}
