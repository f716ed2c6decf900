//! Error types for the TaskFlow notifier.
//!
//! This module defines the error types used throughout the notifier crate,
//! providing structured error handling with clear, human-readable messages.
//!
//! Note that most runtime failures inside the reminder subsystem are contained
//! where they occur (logged, then recovered) rather than propagated: a failed
//! audio cue falls back to the next cue source, a failed desktop notification
//! is skipped, and a corrupt persisted collection is treated as empty. The
//! types below cover the paths that legitimately surface to callers, such as
//! configuration loading and store I/O.

use thiserror::Error;

use crate::audio::AudioError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// Errors that can occur during notifier operations.
#[derive(Error, Debug)]
pub enum NotifierError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reminder store read/write error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Audio cue error.
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for notifier operations.
pub type Result<T> = std::result::Result<T, NotifierError>;
