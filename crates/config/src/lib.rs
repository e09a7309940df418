//! Stashline - Configuration
//!
//! Loads and validates the pipeline configuration from a TOML file.
//! Validation fails fast: a configuration problem aborts startup before any
//! plugin is instantiated.
//!
//! # Example
//!
//! ```toml
//! [pipeline]
//! high_watermark = 30000
//!
//! [telemetry]
//! enabled = true
//! host = "localhost"
//! port = 8125
//!
//! [[inputs]]
//! type = "tcp"
//! [inputs.settings]
//! host = "127.0.0.1"
//! port = 5514
//!
//! [[outputs]]
//! type = "stdout"
//! [outputs.settings]
//! batch_size = 500
//! ```

mod error;
mod pipeline;
mod plugins;
mod telemetry;

pub use error::{ConfigError, Result};
pub use pipeline::{PipelineSection, DEFAULT_HIGH_WATERMARK};
pub use plugins::PluginSection;
pub use telemetry::TelemetrySection;

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pipeline-wide settings (watermarks)
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// Telemetry sink settings
    #[serde(default)]
    pub telemetry: TelemetrySection,

    /// Input plugin instances
    #[serde(default)]
    pub inputs: Vec<PluginSection>,

    /// Output plugin instances
    #[serde(default)]
    pub outputs: Vec<PluginSection>,
}

impl Config {
    /// Load and validate configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks watermark sanity, per-plugin settings that the core itself
    /// depends on (batch sizes), and instance name uniqueness. Plugin
    /// type names are checked later against the registry, which knows the
    /// available implementations.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;

        if self.outputs.is_empty() {
            return Err(ConfigError::NoOutputs);
        }
        if self.inputs.is_empty() {
            return Err(ConfigError::NoInputs);
        }

        let mut seen = HashSet::new();
        for input in &self.inputs {
            if !seen.insert(input.instance_name().to_string()) {
                return Err(ConfigError::duplicate_name("input", input.instance_name()));
            }
        }

        seen.clear();
        for output in &self.outputs {
            if !seen.insert(output.instance_name().to_string()) {
                return Err(ConfigError::duplicate_name("output", output.instance_name()));
            }
            output.validate_output()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [pipeline]
        high_watermark = 30000

        [telemetry]
        enabled = true
        host = "localhost"
        port = 8125

        [[inputs]]
        type = "tcp"
        [inputs.settings]
        host = "127.0.0.1"
        port = 5514

        [[outputs]]
        type = "stdout"
        name = "debug"
        [outputs.settings]
        batch_size = 500
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(FULL).unwrap();
        assert_eq!(config.pipeline.high_watermark, 30000);
        assert!(config.telemetry.enabled);
        assert_eq!(config.inputs.len(), 1);
        assert_eq!(config.inputs[0].instance_name(), "tcp");
        assert_eq!(config.outputs[0].instance_name(), "debug");
    }

    #[test]
    fn test_no_outputs_rejected() {
        let toml = r#"
            [[inputs]]
            type = "tcp"
        "#;
        let err = Config::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::NoOutputs));
    }

    #[test]
    fn test_no_inputs_rejected() {
        let toml = r#"
            [[outputs]]
            type = "stdout"
        "#;
        let err = Config::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::NoInputs));
    }

    #[test]
    fn test_duplicate_output_name_rejected() {
        let toml = r#"
            [[inputs]]
            type = "tcp"

            [[outputs]]
            type = "stdout"

            [[outputs]]
            type = "stdout"
        "#;
        let err = Config::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { kind: "output", .. }));
    }

    #[test]
    fn test_non_positive_batch_size_rejected() {
        let toml = r#"
            [[inputs]]
            type = "tcp"

            [[outputs]]
            type = "stdout"
            [outputs.settings]
            batch_size = 0
        "#;
        let err = Config::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let toml = r#"
            watermark = 5
            [[outputs]]
            type = "stdout"
        "#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/stashline.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
