//! Chat-mode turn controller — drives the typed practice loop.
//!
//! [`ChatController`] owns one complete turn: gate, optimistic insert,
//! backend round trip, reconciliation.
//!
//! # Turn flow
//!
//! ```text
//! send_message(input)
//!   ├─ trim blank / no session / gate busy        → Ignored (no network)
//!   ├─ begin_turn + optimistic user message       [one lock]
//!   ├─ backend.send_chat_turn(…).await            [no lock held]
//!   ├─ Ok  → amend grammar onto the user message,
//!   │        append reply, merge status,
//!   │        completed? → summary + upsell toast
//!   │                     + deferred results redirect
//!   ├─ Err (quota/entitlement) → route to /subscribe
//!   ├─ Err (anything else)     → apology message + error toast
//!   └─ finish_turn(token) on every path           (input never stays locked)
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::client::{Backend, TurnResponse};
use crate::config::SessionConfig;
use crate::nav::{Navigator, Route};
use crate::notify::ToastQueue;
use crate::session::{Message, MessageId, MessagePatch, SessionMode, SharedSessionStore};

use super::handoff;
use super::outcome::{StartOutcome, TurnOutcome};

/// Assistant-role apology appended when a turn fails, so the transcript
/// never ends on an unanswered learner message.
pub const TURN_APOLOGY: &str = "Sorry, something went wrong for a moment. Please try again.";

/// Toast shown when session creation fails for a mundane reason.
pub const SESSION_START_FAILED: &str = "Could not start the session. Please try again.";

// ---------------------------------------------------------------------------
// ChatController
// ---------------------------------------------------------------------------

/// Orchestrates chat-mode turns against the session backend.
///
/// Cheap to share: every field is a handle.  Methods take `&self` so the
/// controller can live in an `Arc` and be called from spawned tasks.
pub struct ChatController {
    store: SharedSessionStore,
    backend: Arc<dyn Backend>,
    toasts: ToastQueue,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
}

impl ChatController {
    pub fn new(
        store: SharedSessionStore,
        backend: Arc<dyn Backend>,
        toasts: ToastQueue,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            backend,
            toasts,
            navigator,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Session creation
    // -----------------------------------------------------------------------

    /// Create a chat session practising `word_ids` and seed the store with
    /// the backend's opening state.
    ///
    /// Guarded by the same turn gate as [`send_message`](Self::send_message),
    /// so a creation request cannot race an in-flight turn.  On failure the
    /// store keeps whatever session it had.
    pub async fn create_session(&self, word_ids: &[String]) -> StartOutcome {
        let Some(token) = self.store.lock().unwrap().begin_turn() else {
            log::debug!("session creation ignored: a turn is in flight");
            return StartOutcome::Ignored;
        };

        let result = self.backend.create_session(SessionMode::Chat, word_ids).await;

        let opening = match result {
            Ok(opening) => opening,
            Err(err) => {
                self.store.lock().unwrap().finish_turn(token);
                return if err.is_upsell() {
                    log::info!("chat session refused: {err}");
                    self.toasts.error(err.to_string());
                    self.navigator.go(Route::Subscribe);
                    StartOutcome::Upsell
                } else {
                    log::warn!("chat session creation failed: {err}");
                    self.toasts.error(SESSION_START_FAILED);
                    StartOutcome::Failed
                };
            }
        };

        log::info!(
            "chat session {} started ({} target words)",
            opening.session_id,
            opening.target_words.len()
        );
        let mut store = self.store.lock().unwrap();
        store.finish_turn(token);
        store.start_session(
            opening.session_id,
            opening.mode,
            opening.target_words,
            opening.initial_message,
        );
        StartOutcome::Started
    }

    // -----------------------------------------------------------------------
    // Turn execution
    // -----------------------------------------------------------------------

    /// Send one learner message and reconcile the tutor's reply.
    pub async fn send_message(&self, input: &str) -> TurnOutcome {
        let content = input.trim();
        if content.is_empty() {
            return TurnOutcome::Ignored;
        }

        // ── 1. Gate + optimistic insert (one lock) ───────────────────────
        let (session_id, token, user_id) = {
            let mut store = self.store.lock().unwrap();
            let Some(session_id) = store.session_id().map(String::from) else {
                log::debug!("chat turn ignored: no active session");
                return TurnOutcome::Ignored;
            };
            let Some(token) = store.begin_turn() else {
                log::debug!("chat turn ignored: another turn is in flight");
                return TurnOutcome::Ignored;
            };
            let user_id = store.add_message(Message::user(content));
            (session_id, token, user_id)
        };

        // ── 2. Backend round trip (lock released) ────────────────────────
        let result = self.backend.send_chat_turn(&session_id, content).await;

        // ── 3. Reconcile ─────────────────────────────────────────────────
        let outcome = match result {
            Ok(response) => self.settle(&session_id, user_id, response),
            Err(err) if err.is_upsell() => {
                log::info!("chat turn rejected: {err}");
                self.navigator.go(Route::Subscribe);
                TurnOutcome::Upsell
            }
            Err(err) => {
                log::warn!("chat turn failed: {err}");
                self.store
                    .lock()
                    .unwrap()
                    .add_message_for(&session_id, Message::assistant(TURN_APOLOGY));
                self.toasts.error(err.to_string());
                TurnOutcome::Failed
            }
        };

        // ── 4. Release the gate ──────────────────────────────────────────
        self.store.lock().unwrap().finish_turn(token);
        outcome
    }

    /// Fold a successful turn response into the store.
    fn settle(
        &self,
        session_id: &str,
        user_id: MessageId,
        response: TurnResponse,
    ) -> TurnOutcome {
        let TurnResponse {
            message,
            session_status,
            summary,
        } = response;

        let completed = {
            let mut store = self.store.lock().unwrap();

            // The correction must land on the learner's own message before
            // the reply appears below it.
            if let Some(correction) = &message.grammar_correction {
                store.amend_user_message(
                    session_id,
                    user_id,
                    &MessagePatch::grammar(correction.clone()),
                );
            }

            if store.add_message_for(session_id, message).is_none() {
                log::debug!("chat turn settled into replaced session {session_id}, dropped");
                return TurnOutcome::Ignored;
            }
            store.update_status(session_id, &session_status);
            session_status.is_completed && summary.is_some()
        };

        if completed {
            if let Some(summary) = summary {
                let owned = handoff::complete_session(
                    &self.store,
                    &self.toasts,
                    &self.navigator,
                    session_id,
                    summary,
                    Duration::from_millis(self.config.chat_redirect_delay_ms),
                );
                if owned {
                    return TurnOutcome::Completed;
                }
            }
        }
        TurnOutcome::Settled
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
