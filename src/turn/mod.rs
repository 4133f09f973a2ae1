//! Turn orchestration for vocatalk practice sessions.
//!
//! This module wires the full input → backend → store reconciliation loop
//! for both practice modes and owns every side effect a turn can have:
//! toasts, routing, speech, and the end-of-session handoff.
//!
//! # Architecture
//!
//! ```text
//! learner input                     finished recording
//!        │                                 │
//!        ▼                                 ▼
//! ChatController::send_message   SpeakingController::submit_recording
//!        │                                 │        (or submit_transcript)
//!        ├─ gate: one turn at a time (store's turn token)
//!        ├─ optimistic user message (placeholder in speaking mode)
//!        ├─ Backend round trip (no lock held across the await)
//!        └─ reconcile: amend → append reply → merge status
//!                 │
//!                 ├─ completed → summary, upsell toast,
//!                 │              deferred redirect to results
//!                 ├─ quota/entitlement → route to /subscribe
//!                 └─ failure → fixed apology message + error toast
//!
//! SharedSessionStore (Arc<Mutex<SessionStore>>) ←── read by the UI layer
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vocatalk::client::{Backend, HttpBackend};
//! use vocatalk::config::AppConfig;
//! use vocatalk::nav::{LogNavigator, Navigator};
//! use vocatalk::notify::ToastQueue;
//! use vocatalk::session::new_shared_store;
//! use vocatalk::turn::ChatController;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let store = new_shared_store();
//!     let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_config(&config.api));
//!     let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);
//!
//!     let chat = ChatController::new(
//!         store.clone(),
//!         backend,
//!         ToastQueue::new(),
//!         navigator,
//!         config.session.clone(),
//!     );
//!
//!     chat.create_session(&["w1".into(), "w2".into(), "w3".into()]).await;
//!     chat.send_message("I felt resilient today.").await;
//! }
//! ```

pub mod chat;
mod handoff;
pub mod outcome;
pub mod speaking;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use chat::ChatController;
pub use outcome::{StartOutcome, TurnOutcome};
pub use speaking::SpeakingController;
