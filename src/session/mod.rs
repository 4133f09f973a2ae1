//! Session state: transcript messages, progress, and the shared store.
//!
//! The store is the only writer-facing surface; wire types in
//! [`types`] and [`message`] pass through serde unchanged on every turn.

pub mod message;
pub mod store;
pub mod types;

pub use message::{Message, MessagePatch, Role, SpeakingFeedback};
pub use store::{
    new_shared_store, MessageId, SessionStore, SharedSessionStore, TurnPhase, TurnToken,
};
pub use types::{SessionMode, SessionStatus, SessionSummary, TargetWord, WordUsageDetail};
