//! Configuration module for vocatalk.
//!
//! `AppConfig` gathers one sub-config per subsystem and round-trips through
//! TOML with `AppConfig::load` / `AppConfig::save`; `AppPaths` decides where
//! that file (and the recording scratch space) lives on each platform.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{ApiConfig, AppConfig, AudioConfig, SessionConfig, SpeechConfig};
