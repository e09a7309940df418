//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
///
/// All of these are fatal at startup: a pipeline never runs with a
/// configuration it could not validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two plugin instances share a name
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// Component kind ("input" or "output")
        kind: &'static str,
        /// The conflicting instance name
        name: String,
    },

    /// A field has an invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type (e.g. "output", "pipeline")
        component: &'static str,
        /// Name of the component instance
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// No outputs configured
    #[error("no outputs are configured - at least one output must exist before inputs start")]
    NoOutputs,

    /// No inputs configured
    #[error("no inputs are configured - the pipeline would never receive events")]
    NoInputs,
}

impl ConfigError {
    /// Create a DuplicateName error
    pub fn duplicate_name(kind: &'static str, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }
}
