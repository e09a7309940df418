//! Plugin error types

use thiserror::Error;

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors raised by plugin factories and running plugins
#[derive(Debug, Error)]
pub enum PluginError {
    /// Invalid or missing plugin settings (fatal at startup)
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to bind a listener
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A batch write to the output failed
    #[error("write failed: {0}")]
    Write(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pipeline-side channel is gone; the plugin must stop
    #[error("event channel closed")]
    ChannelClosed,
}

impl PluginError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::config("port is required");
        assert!(err.to_string().contains("port is required"));

        let err = PluginError::write("bulk index rejected");
        assert!(err.to_string().contains("write failed"));

        let err = PluginError::ChannelClosed;
        assert!(err.to_string().contains("channel closed"));
    }
}
