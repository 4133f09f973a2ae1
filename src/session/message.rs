//! Conversation messages and the amendment patch type.
//!
//! [`Message`] is the unit of the session transcript.  The backend returns
//! assistant messages with optional per-turn extras (word usage map, speaking
//! feedback, a hint, a grammar correction); user messages start as plain text
//! and may later be amended in place via [`MessagePatch`] — e.g. when the
//! server's transcription replaces a placeholder, or a grammar correction is
//! attached to what the learner typed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The learner.
    User,
    /// The AI tutor.
    Assistant,
}

// ---------------------------------------------------------------------------
// SpeakingFeedback
// ---------------------------------------------------------------------------

/// Per-utterance feedback attached to assistant replies in speaking mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakingFeedback {
    /// Pronunciation notes.
    pub pronunciation: String,
    /// Grammar notes.
    pub grammar: String,
    /// Vocabulary-use notes.
    pub vocabulary: String,
    /// Overall score for the utterance, 0 to 10.
    pub score: u8,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One transcript entry.
///
/// All optional fields come from the backend; locally constructed messages
/// (optimistic inserts, apologies, placeholders) carry `None` for each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Which target words this turn touched, per the server's judgement.
    pub word_usage: Option<BTreeMap<String, bool>>,
    /// Speaking-mode feedback; `None` for chat turns and user messages.
    pub feedback: Option<SpeakingFeedback>,
    /// A nudge towards an unused target word.
    pub hint: Option<String>,
    /// Corrected form of the learner's sentence, shown alongside the original.
    pub grammar_correction: Option<String>,
}

impl Message {
    /// A plain learner message with no extras.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            word_usage: None,
            feedback: None,
            hint: None,
            grammar_correction: None,
        }
    }

    /// A plain tutor message with no extras.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            word_usage: None,
            feedback: None,
            hint: None,
            grammar_correction: None,
        }
    }
}

// ---------------------------------------------------------------------------
// MessagePatch
// ---------------------------------------------------------------------------

/// A partial update merged into an existing user message.
///
/// Only the fields that are `Some` are written; everything else on the
/// target message is left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub grammar_correction: Option<String>,
}

impl MessagePatch {
    /// Patch that replaces the message text (transcription result).
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    /// Patch that attaches a grammar correction without touching the text.
    pub fn grammar(correction: impl Into<String>) -> Self {
        Self {
            grammar_correction: Some(correction.into()),
            ..Default::default()
        }
    }

    /// Merge this patch into `message`.
    pub fn apply(&self, message: &mut Message) {
        if let Some(content) = &self.content {
            message.content = content.clone();
        }
        if let Some(correction) = &self.grammar_correction {
            message.grammar_correction = Some(correction.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
