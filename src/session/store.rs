//! Session store — the single source of truth for the active session.
//!
//! [`SessionStore`] owns the transcript, target words, progress status,
//! summary and the turn gate.  Controllers and the rendering layer share it
//! via [`SharedSessionStore`] (`Arc<Mutex<SessionStore>>`) — cheap to clone,
//! locked for short critical sections only, never across an `.await`.
//!
//! # Turn gate
//!
//! ```text
//! Idle ──begin_turn()──▶ Sending ──finish_turn(token)──▶ Idle
//!         └─ returns a TurnToken; a second begin_turn while
//!            Sending returns None, so turns cannot overlap
//! ```
//!
//! Every turn bumps an internal sequence number and the token carries it.
//! `finish_turn` with a token from an abandoned session or superseded turn
//! is ignored, so a late completion can never release somebody else's turn.
//!
//! # Late responses
//!
//! Mutations that happen after an `.await` (`add_message_for`,
//! `amend_user_message`, `update_status`, `set_summary`) take the session id
//! the caller captured when the turn began and are silently rejected when
//! the store has since moved to a different session.

use std::sync::{Arc, Mutex};

use super::message::{Message, MessagePatch, Role};
use super::types::{SessionMode, SessionStatus, SessionSummary, TargetWord};

// ---------------------------------------------------------------------------
// MessageId
// ---------------------------------------------------------------------------

/// Stable handle to a transcript entry, issued by
/// [`SessionStore::add_message`].
///
/// Handles are only meaningful for the session that issued them; every
/// amendment re-validates the session id, so a handle that outlives its
/// session is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageId(usize);

// ---------------------------------------------------------------------------
// TurnPhase / TurnToken
// ---------------------------------------------------------------------------

/// Whether a turn is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No request outstanding; input is accepted.
    Idle,
    /// A turn is awaiting its backend response; new turns are refused.
    Sending,
}

impl TurnPhase {
    /// `true` while a backend call is outstanding.  The rendering layer uses
    /// this to disable the send control.
    pub fn is_busy(&self) -> bool {
        matches!(self, TurnPhase::Sending)
    }
}

impl Default for TurnPhase {
    fn default() -> Self {
        TurnPhase::Idle
    }
}

/// Proof that the holder opened the currently in-flight turn.
///
/// Deliberately not `Clone`/`Copy`: it is consumed by
/// [`SessionStore::finish_turn`], so a turn can only be closed once.
#[derive(Debug, PartialEq, Eq)]
pub struct TurnToken {
    seq: u64,
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// All state for the active learning session.
///
/// Fields are private; every mutation goes through a method so the
/// monotonicity and session-guard rules cannot be bypassed.
pub struct SessionStore {
    session_id: Option<String>,
    mode: Option<SessionMode>,
    target_words: Vec<TargetWord>,
    messages: Vec<Message>,
    status: SessionStatus,
    summary: Option<SessionSummary>,
    phase: TurnPhase,
    /// Bumped on every `begin_turn` and every session change, so stale
    /// `TurnToken`s never match again.
    turn_seq: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            session_id: None,
            mode: None,
            target_words: Vec::new(),
            messages: Vec::new(),
            status: SessionStatus::default(),
            summary: None,
            phase: TurnPhase::Idle,
            turn_seq: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Initialise the store for a freshly created session.
    ///
    /// Replaces *everything*: transcript becomes `[initial_message]`, every
    /// target word starts unused, summary is cleared and the turn gate is
    /// forced back to `Idle`.  An already-active session is silently
    /// discarded — this method is the single choke point if that ever needs
    /// a confirmation step.
    pub fn start_session(
        &mut self,
        session_id: impl Into<String>,
        mode: SessionMode,
        target_words: Vec<TargetWord>,
        initial_message: Message,
    ) {
        let session_id = session_id.into();
        if let Some(old) = &self.session_id {
            log::warn!("session store: discarding active session {old} for {session_id}");
        }

        self.status = SessionStatus::fresh(&target_words);
        self.session_id = Some(session_id);
        self.mode = Some(mode);
        self.target_words = target_words;
        self.messages = vec![initial_message];
        self.summary = None;
        self.phase = TurnPhase::Idle;
        self.turn_seq += 1;
    }

    /// Drop all session state, returning the store to its initial empty
    /// form.  Outstanding turn tokens are invalidated.
    pub fn reset_session(&mut self) {
        self.session_id = None;
        self.mode = None;
        self.target_words.clear();
        self.messages.clear();
        self.status = SessionStatus::default();
        self.summary = None;
        self.phase = TurnPhase::Idle;
        self.turn_seq += 1;
    }

    // -----------------------------------------------------------------------
    // Turn gate
    // -----------------------------------------------------------------------

    /// Open a turn: `Idle -> Sending`.
    ///
    /// Returns `None` while another turn is in flight — the caller must
    /// treat that as "ignore this input", not as an error.
    pub fn begin_turn(&mut self) -> Option<TurnToken> {
        if self.phase.is_busy() {
            return None;
        }
        self.phase = TurnPhase::Sending;
        self.turn_seq += 1;
        Some(TurnToken { seq: self.turn_seq })
    }

    /// Close the turn opened by `token`: `Sending -> Idle`.
    ///
    /// A stale token (superseded turn, replaced session) is ignored so the
    /// gate state stays owned by whoever holds the current token.
    pub fn finish_turn(&mut self, token: TurnToken) {
        if token.seq == self.turn_seq && self.phase.is_busy() {
            self.phase = TurnPhase::Idle;
        } else {
            log::debug!("session store: stale turn token ignored");
        }
    }

    /// `true` while a turn is awaiting its backend response.
    pub fn is_loading(&self) -> bool {
        self.phase.is_busy()
    }

    // -----------------------------------------------------------------------
    // Transcript
    // -----------------------------------------------------------------------

    /// Append a message and return its handle.  Order of calls is order of
    /// display — the transcript is never reordered.
    pub fn add_message(&mut self, message: Message) -> MessageId {
        self.messages.push(message);
        MessageId(self.messages.len() - 1)
    }

    /// Append a message on behalf of an asynchronous completion.
    ///
    /// Returns `None` without touching the store when `session_id` is no
    /// longer the active session (the response arrived too late).
    pub fn add_message_for(&mut self, session_id: &str, message: Message) -> Option<MessageId> {
        if !self.is_current(session_id) {
            log::debug!("session store: dropping message for stale session {session_id}");
            return None;
        }
        Some(self.add_message(message))
    }

    /// Merge `patch` into the user message identified by `id`.
    ///
    /// Returns `false` — leaving the transcript untouched — when the session
    /// no longer matches, the handle does not resolve, or the target is not
    /// a user message.  Fields the patch leaves unset keep their value.
    pub fn amend_user_message(
        &mut self,
        session_id: &str,
        id: MessageId,
        patch: &MessagePatch,
    ) -> bool {
        if !self.is_current(session_id) {
            log::debug!("session store: dropping amendment for stale session {session_id}");
            return false;
        }
        match self.messages.get_mut(id.0) {
            Some(message) if message.role == Role::User => {
                patch.apply(message);
                true
            }
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Progress
    // -----------------------------------------------------------------------

    /// Fold a server status snapshot into the session, clamped monotonic
    /// (see [`SessionStatus::merge`]).  Ignored for a stale session id.
    pub fn update_status(&mut self, session_id: &str, status: &SessionStatus) -> bool {
        if !self.is_current(session_id) {
            log::debug!("session store: dropping status for stale session {session_id}");
            return false;
        }
        self.status.merge(status);
        true
    }

    /// Record the end-of-session summary.  First write wins: returns `false`
    /// when a summary is already present or the session id is stale, so a
    /// duplicated completion response cannot re-trigger completion side
    /// effects.
    pub fn set_summary(&mut self, session_id: &str, summary: SessionSummary) -> bool {
        if !self.is_current(session_id) || self.summary.is_some() {
            return false;
        }
        self.summary = Some(summary);
        true
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn mode(&self) -> Option<SessionMode> {
        self.mode
    }

    pub fn target_words(&self) -> &[TargetWord] {
        &self.target_words
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    fn is_current(&self, session_id: &str) -> bool {
        self.session_id.as_deref() == Some(session_id)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SharedSessionStore
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionStore`].
///
/// Cheap to clone (`Arc` clone).  Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedSessionStore = Arc<Mutex<SessionStore>>;

/// Construct a new [`SharedSessionStore`] wrapping an empty store.
pub fn new_shared_store() -> SharedSessionStore {
    Arc::new(Mutex::new(SessionStore::new()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
