//! Backend REST client: the `Backend` trait, its reqwest implementation,
//! and the wire response types.

pub mod backend;
pub mod types;

pub use backend::{ApiError, Backend, HttpBackend};
pub use types::{SessionCreateResponse, TranscribeResponse, Transcription, TurnResponse};

#[cfg(test)]
pub use backend::MockBackend;
