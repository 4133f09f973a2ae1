//! Session-level wire types: mode, target words, progress status, summary.
//!
//! Field names match the backend JSON exactly — these structs go straight
//! through serde on every turn.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionMode
// ---------------------------------------------------------------------------

/// Which practice surface the session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Typed conversation.
    Chat,
    /// Spoken conversation with server-side transcription.
    Speaking,
}

// ---------------------------------------------------------------------------
// TargetWord
// ---------------------------------------------------------------------------

/// A vocabulary word the learner is asked to use during the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetWord {
    /// Backend identifier, used when creating a session.
    pub id: String,
    /// The word itself — also the key in [`SessionStatus::words_used`].
    pub word: String,
    /// Gloss in the learner's UI language (localised server-side).
    pub definition: String,
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Server-judged progress snapshot, returned with every turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Per-target-word usage flags.
    pub words_used: BTreeMap<String, bool>,
    /// Number of `true` entries in `words_used`.
    pub completed_count: u32,
    /// `true` once every target word has been used.
    pub is_completed: bool,
}

impl SessionStatus {
    /// Status for a brand-new session: every target word unused.
    pub fn fresh<'a>(words: impl IntoIterator<Item = &'a TargetWord>) -> Self {
        let words_used: BTreeMap<String, bool> = words
            .into_iter()
            .map(|w| (w.word.clone(), false))
            .collect();
        Self {
            words_used,
            completed_count: 0,
            is_completed: false,
        }
    }

    /// Fold a server snapshot into this status, never losing progress.
    ///
    /// A word the server once reported used stays used, `is_completed` never
    /// reverts, and `completed_count` is recomputed from the merged map so
    /// the three fields cannot drift apart.
    pub fn merge(&mut self, incoming: &SessionStatus) {
        for (word, used) in &incoming.words_used {
            let entry = self.words_used.entry(word.clone()).or_insert(false);
            *entry = *entry || *used;
        }
        self.is_completed = self.is_completed || incoming.is_completed;
        self.completed_count = self.words_used.values().filter(|used| **used).count() as u32;
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            words_used: BTreeMap::new(),
            completed_count: 0,
            is_completed: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSummary
// ---------------------------------------------------------------------------

/// Per-word detail inside the end-of-session summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordUsageDetail {
    pub word: String,
    /// Excerpt of the learner sentence that used the word, if any.
    pub used_in: Option<String>,
    /// Tutor's remark about how the word was used.
    pub feedback: String,
}

/// Final session report, delivered once by the server on the completing turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub duration_seconds: u64,
    pub message_count: u32,
    pub word_usage_details: Vec<WordUsageDetail>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
