//! Core error types for pomopet-core.
//!
//! Scheduling and reward math can only fail through [`SessionError`];
//! everything else here belongs to the audio, settings and storage edges.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::SessionStatus;

/// Core error type for pomopet-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session scheduling / state machine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Audio output errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the cycle scheduler and the session state machine.
///
/// Both are programmer/caller errors: they are surfaced, never clamped or
/// swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A duration or round count was zero.
    #[error("Invalid timer configuration: '{field}' must be positive (got {value})")]
    InvalidConfiguration { field: &'static str, value: u32 },

    /// The requested operation makes no sense in the current status.
    #[error("Cannot {operation} while session is {status:?}")]
    InvalidTransition {
        operation: &'static str,
        status: SessionStatus,
    },

    /// Starting segment index past the end of the plan.
    #[error("Segment index {index} out of range for a plan of {len} segments")]
    SegmentOutOfRange { index: usize, len: usize },

    /// Custom-mode slider position outside `1..=96`.
    #[error("Slider position {0} is outside 1..=96")]
    InvalidSliderPosition(u32),

    /// Minutes that no slider position maps to.
    #[error("{0} minutes cannot be represented on the duration slider")]
    UnrepresentableDuration(u32),
}

/// Audio output errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The output refused to start without a user gesture.
    #[error("Playback of '{0}' was blocked by the output device")]
    AutoplayBlocked(String),

    /// Any other device failure.
    #[error("Output device error: {0}")]
    Device(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the settings tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored value could not be decoded
    #[error("Corrupt value for '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
