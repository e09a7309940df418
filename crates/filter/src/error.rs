//! Filter error types

use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Errors raised by filters
///
/// A filter error is contained to the event that triggered it: the event
/// becomes `Errored`, the chain aborts, and the pipeline keeps running.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Filter-specific failure
    #[error("{0}")]
    Message(String),

    /// Payload could not be (de)serialized the way the filter expected
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    /// Create a message error
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
