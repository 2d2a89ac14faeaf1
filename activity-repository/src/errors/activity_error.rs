//! Activity error types.
//!
//! Invalid arguments and invariant violations are distinct, explicit failures.
//! Lookups of unknown entities are not errors at all: reads return an empty
//! result instead.

use thiserror::Error;

/// Unified errors from chain store and service operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityError {
    /// A required identifier was missing or empty. Nothing was mutated.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A chain was found with more than one outgoing or incoming link where at
    /// most one is allowed, or with a link missing where one must exist.
    ///
    /// This indicates earlier corruption and is never repaired automatically.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The backing store failed.
    #[error("Store error: {0}")]
    StoreError(String),

    /// A read asked for more than the configured maximum.
    #[error("Read of {requested} exceeds maximum {max}")]
    ReadLimitExceeded { requested: usize, max: usize },
}

impl ActivityError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an invariant violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    /// Create a read limit error.
    pub fn read_limit_exceeded(requested: usize, max: usize) -> Self {
        Self::ReadLimitExceeded { requested, max }
    }
}
