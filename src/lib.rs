//! vocatalk — client-side orchestration core for conversational vocabulary
//! practice.
//!
//! A learner practises a short list of target words by conversing with an
//! AI tutor, either typing (chat mode) or speaking aloud (speaking mode).
//! This crate owns everything between the input surface and the backend:
//! the authoritative session transcript, the one-turn-at-a-time pipeline,
//! microphone capture, notifications, and the end-of-session handoff.
//!
//! # Architecture
//!
//! ```text
//! typed input ──────────────► turn::ChatController ─────┐
//!                                                       │
//! microphone ─► audio::Recorder ─► audio::AudioClip     │ client::Backend
//!                     │                                 │ (HTTP + multipart)
//!                     └─────► turn::SpeakingController ─┘
//!                                       │
//!            ┌──────────────────────────┤
//!            ▼                          ▼
//! session::SessionStore        side effects:
//! (Arc<Mutex<…>>, read           notify::ToastQueue
//!  by the UI layer)              nav::Navigator
//!                                speech::SpeechSynthesizer
//! ```
//!
//! The store never talks to the network and the controllers never hold its
//! lock across an `await`; every backend response is reconciled against the
//! session id it was produced for, so late replies from a replaced session
//! are dropped rather than spliced into the wrong transcript.

pub mod audio;
pub mod client;
pub mod config;
pub mod nav;
pub mod notify;
pub mod session;
pub mod speech;
pub mod turn;
