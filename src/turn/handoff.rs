//! Completion side effects shared by the chat and speaking controllers.
//!
//! When a turn completes the session, exactly one caller gets to run the
//! side effects: record the summary, surface the upsell nudge, and schedule
//! the deferred handoff to the results view.  "Exactly one" is enforced by
//! the store's first-write-wins summary rule
//! ([`crate::session::SessionStore::set_summary`]), so a duplicated
//! completion response cannot double-toast or double-navigate.
//!
//! The handoff itself is a single-shot sleep on the runtime.  It is not
//! cancellable by further input; instead it re-checks the active session id
//! when it fires, so a timer outliving its session simply does nothing.

use std::sync::Arc;
use std::time::Duration;

use crate::nav::{Navigator, Route};
use crate::notify::ToastQueue;
use crate::session::{SessionSummary, SharedSessionStore};

/// Upsell nudge shown once per completed session.
pub(crate) const COMPLETION_UPSELL: &str =
    "Session complete! Go premium for unlimited practice.";

/// Label on the upsell toast's action button.
pub(crate) const UPSELL_ACTION_LABEL: &str = "Upgrade";

// ---------------------------------------------------------------------------
// complete_session
// ---------------------------------------------------------------------------

/// Run the completion side effects for `session_id`.
///
/// Returns `true` when this call recorded the summary (and therefore owned
/// the toast and the scheduled redirect); `false` when the summary was
/// already set or the session id is stale, in which case nothing happens.
pub(crate) fn complete_session(
    store: &SharedSessionStore,
    toasts: &ToastQueue,
    navigator: &Arc<dyn Navigator>,
    session_id: &str,
    summary: SessionSummary,
    redirect_delay: Duration,
) -> bool {
    if !store.lock().unwrap().set_summary(session_id, summary) {
        log::debug!("completion for {session_id} already handled, skipping side effects");
        return false;
    }

    log::info!("session {session_id} completed");
    toasts.premium(COMPLETION_UPSELL, UPSELL_ACTION_LABEL, Route::Subscribe);
    schedule_results_redirect(
        Arc::clone(store),
        Arc::clone(navigator),
        session_id.to_string(),
        redirect_delay,
    );
    true
}

// ---------------------------------------------------------------------------
// schedule_results_redirect
// ---------------------------------------------------------------------------

/// Navigate to the results view for `session_id` after `delay`, unless the
/// store has moved on to a different session by then.
pub(crate) fn schedule_results_redirect(
    store: SharedSessionStore,
    navigator: Arc<dyn Navigator>,
    session_id: String,
    delay: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let still_active = store.lock().unwrap().session_id() == Some(session_id.as_str());
        if still_active {
            navigator.go(Route::SessionResults { session_id });
        } else {
            log::debug!("results redirect for {session_id} dropped: session replaced");
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::RecordingNavigator;
    use crate::session::{new_shared_store, Message, SessionMode, TargetWord};

    fn started_store(session_id: &str) -> SharedSessionStore {
        let store = new_shared_store();
        store.lock().unwrap().start_session(
            session_id,
            SessionMode::Chat,
            vec![TargetWord {
                id: "w1".into(),
                word: "resilient".into(),
                definition: "able to recover quickly".into(),
            }],
            Message::assistant("Welcome!"),
        );
        store
    }

    fn summary(session_id: &str) -> SessionSummary {
        SessionSummary {
            session_id: session_id.into(),
            duration_seconds: 90,
            message_count: 6,
            word_usage_details: vec![],
        }
    }

    #[tokio::test]
    async fn redirect_fires_for_the_active_session() {
        let store = started_store("sess-1");
        let nav = Arc::new(RecordingNavigator::new());
        let nav_dyn: Arc<dyn Navigator> = nav.clone();

        schedule_results_redirect(
            Arc::clone(&store),
            nav_dyn,
            "sess-1".into(),
            Duration::from_millis(5),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(
            nav.routes(),
            vec![Route::SessionResults {
                session_id: "sess-1".into()
            }]
        );
    }

    /// A timer that outlives its session must do nothing.
    #[tokio::test]
    async fn redirect_dropped_when_session_replaced() {
        let store = started_store("sess-1");
        let nav = Arc::new(RecordingNavigator::new());
        let nav_dyn: Arc<dyn Navigator> = nav.clone();

        schedule_results_redirect(
            Arc::clone(&store),
            nav_dyn,
            "sess-1".into(),
            Duration::from_millis(5),
        );
        store.lock().unwrap().start_session(
            "sess-2",
            SessionMode::Chat,
            vec![],
            Message::assistant("hi"),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(nav.routes().is_empty(), "late redirect fired anyway");
    }

    /// Only the first completion call owns the side effects.
    #[tokio::test]
    async fn completion_side_effects_run_exactly_once() {
        let store = started_store("sess-1");
        let nav: Arc<dyn Navigator> = Arc::new(RecordingNavigator::new());
        let toasts = ToastQueue::new();

        let first = complete_session(
            &store,
            &toasts,
            &nav,
            "sess-1",
            summary("sess-1"),
            Duration::from_millis(5),
        );
        let second = complete_session(
            &store,
            &toasts,
            &nav,
            "sess-1",
            summary("sess-1"),
            Duration::from_millis(5),
        );

        assert!(first);
        assert!(!second);
        assert_eq!(toasts.active().len(), 1);
        assert_eq!(
            store.lock().unwrap().summary().unwrap().duration_seconds,
            90
        );
    }

    #[tokio::test]
    async fn completion_for_stale_session_is_refused() {
        let store = started_store("sess-1");
        let nav: Arc<dyn Navigator> = Arc::new(RecordingNavigator::new());
        let toasts = ToastQueue::new();

        let applied = complete_session(
            &store,
            &toasts,
            &nav,
            "sess-9",
            summary("sess-9"),
            Duration::from_millis(5),
        );

        assert!(!applied);
        assert!(toasts.active().is_empty());
        assert!(store.lock().unwrap().summary().is_none());
    }
}
