//! Error types for the activity feed binary.

use activity_repository::ActivityError;
use thiserror::Error;

/// Errors that stop a replay.
///
/// Rejected events (bad input, invalid arguments) are reported per event and
/// do not surface here.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Reading input or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding a result line failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service failed in a way that must not be skipped over.
    #[error("Activity error: {0}")]
    Activity(#[from] ActivityError),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),
}

impl ReplayError {
    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
