//! Pipeline error types

use thiserror::Error;

/// Errors raised while running the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A plugin failed (bind error, write error, ...)
    #[error(transparent)]
    Plugin(#[from] stashline_plugin::PluginError),

    /// An internal channel closed unexpectedly
    #[error("pipeline channel closed")]
    ChannelClosed,

    /// A pipeline task panicked
    #[error("pipeline task panicked: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_error_passthrough() {
        let err: PipelineError = stashline_plugin::PluginError::config("bad port").into();
        assert!(err.to_string().contains("bad port"));
    }
}
