//! Input and output plugin sections
//!
//! Each `[[inputs]]` / `[[outputs]]` entry names a plugin implementation by
//! type and carries an opaque settings map the plugin's factory interprets.
//! The core only understands the handful of settings it enforces itself
//! (batch sizes must be positive).

use std::collections::HashMap;

use serde::Deserialize;

use crate::{ConfigError, Result};

/// One configured plugin instance
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginSection {
    /// Implementation type name (e.g. "tcp", "stdout")
    #[serde(rename = "type")]
    pub type_name: String,

    /// Instance name; defaults to the type name
    ///
    /// Needed when two instances of the same type are configured.
    #[serde(default)]
    pub name: Option<String>,

    /// Plugin-specific settings, validated by the plugin factory
    #[serde(default)]
    pub settings: HashMap<String, toml::Value>,
}

impl PluginSection {
    /// Effective instance name
    pub fn instance_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.type_name)
    }

    /// Core-level validation applied to output sections
    ///
    /// The registry cannot start an output whose batch size is
    /// non-positive, so that is rejected here before instantiation.
    pub fn validate_output(&self) -> Result<()> {
        if let Some(value) = self.settings.get("batch_size") {
            match value.as_integer() {
                Some(n) if n > 0 => {}
                Some(n) => {
                    return Err(ConfigError::invalid_value(
                        "output",
                        self.instance_name(),
                        "batch_size",
                        format!("must be positive, got {}", n),
                    ));
                }
                None => {
                    return Err(ConfigError::invalid_value(
                        "output",
                        self.instance_name(),
                        "batch_size",
                        "must be an integer",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_name_defaults_to_type() {
        let section: PluginSection = toml::from_str("type = \"tcp\"").unwrap();
        assert_eq!(section.instance_name(), "tcp");
    }

    #[test]
    fn test_explicit_instance_name() {
        let section: PluginSection =
            toml::from_str("type = \"tcp\"\nname = \"tcp_syslog\"").unwrap();
        assert_eq!(section.instance_name(), "tcp_syslog");
    }

    #[test]
    fn test_settings_are_opaque() {
        let section: PluginSection = toml::from_str(
            r#"
            type = "elasticsearch"
            [settings]
            hostname = "127.0.0.1"
            port = 9200
            batch_size = 500
            index_prefix = "stash"
            "#,
        )
        .unwrap();
        assert_eq!(
            section.settings.get("index_prefix").and_then(|v| v.as_str()),
            Some("stash")
        );
        assert!(section.validate_output().is_ok());
    }

    #[test]
    fn test_negative_batch_size_rejected() {
        let section: PluginSection = toml::from_str(
            "type = \"stdout\"\n[settings]\nbatch_size = -1",
        )
        .unwrap();
        assert!(section.validate_output().is_err());
    }

    #[test]
    fn test_non_integer_batch_size_rejected() {
        let section: PluginSection = toml::from_str(
            "type = \"stdout\"\n[settings]\nbatch_size = \"lots\"",
        )
        .unwrap();
        assert!(section.validate_output().is_err());
    }
}
