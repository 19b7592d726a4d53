//! Error types for bulk runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DEFAULT_FAILURE_MESSAGE;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, BulkError>;

/// Errors returned by engine operations.
///
/// Per-item failures are never reported here; they are recorded on the
/// item itself as an [`ItemFailure`] message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkError {
    /// A run is already in progress.
    #[error("A bulk run is already in progress")]
    AlreadyRunning,

    /// Two source items projected to the same id.
    #[error("Duplicate item id: {id}")]
    DuplicateId { id: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Failure of a single item's operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// A human-readable error message.
    pub message: String,
}

impl ItemFailure {
    /// Create a failure, falling back to a generic message when empty.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::default()
        } else {
            Self { message }
        }
    }

    /// Capture the display form of any error value.
    pub fn from_display(error: &impl fmt::Display) -> Self {
        Self::new(error.to_string())
    }
}

impl Default for ItemFailure {
    fn default() -> Self {
        Self {
            message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<String> for ItemFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ItemFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
