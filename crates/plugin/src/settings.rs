//! Plugin settings - opaque key/value maps interpreted by factories
//!
//! Settings come from the `[inputs.settings]` / `[outputs.settings]` tables
//! in the configuration file. Factories pull typed values out and fail fast
//! on anything malformed; unknown keys are rejected at the end of parsing
//! so typos surface at startup instead of being silently ignored.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::{PluginError, Result};

/// Typed accessor over a plugin's settings map
///
/// Tracks which keys were read so `finish()` can reject unknown settings.
#[derive(Debug, Clone, Default)]
pub struct PluginSettings {
    values: HashMap<String, toml::Value>,
    consumed: HashSet<String>,
}

impl PluginSettings {
    /// Wrap a raw settings map
    pub fn new(values: HashMap<String, toml::Value>) -> Self {
        Self {
            values,
            consumed: HashSet::new(),
        }
    }

    /// Whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get a string setting
    pub fn get_str(&mut self, key: &str) -> Result<Option<String>> {
        self.consumed.insert(key.to_string());
        match self.values.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| type_error(key, "a string", v)),
        }
    }

    /// Get a required string setting
    pub fn require_str(&mut self, key: &str) -> Result<String> {
        self.get_str(key)?
            .ok_or_else(|| PluginError::config(format!("missing required setting '{}'", key)))
    }

    /// Get an integer setting
    pub fn get_int(&mut self, key: &str) -> Result<Option<i64>> {
        self.consumed.insert(key.to_string());
        match self.values.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_integer()
                .map(Some)
                .ok_or_else(|| type_error(key, "an integer", v)),
        }
    }

    /// Get a positive integer setting as usize
    pub fn get_usize(&mut self, key: &str) -> Result<Option<usize>> {
        match self.get_int(key)? {
            None => Ok(None),
            Some(n) if n > 0 => Ok(Some(n as usize)),
            Some(n) => Err(PluginError::config(format!(
                "setting '{}' must be positive, got {}",
                key, n
            ))),
        }
    }

    /// Get a port number setting
    pub fn get_port(&mut self, key: &str) -> Result<Option<u16>> {
        match self.get_int(key)? {
            None => Ok(None),
            Some(n) if (1..=u16::MAX as i64).contains(&n) => Ok(Some(n as u16)),
            Some(n) => Err(PluginError::config(format!(
                "setting '{}' is not a valid port: {}",
                key, n
            ))),
        }
    }

    /// Get a boolean setting
    pub fn get_bool(&mut self, key: &str) -> Result<Option<bool>> {
        self.consumed.insert(key.to_string());
        match self.values.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| type_error(key, "a boolean", v)),
        }
    }

    /// Get a millisecond duration setting
    pub fn get_duration_ms(&mut self, key: &str) -> Result<Option<Duration>> {
        match self.get_int(key)? {
            None => Ok(None),
            Some(n) if n > 0 => Ok(Some(Duration::from_millis(n as u64))),
            Some(n) => Err(PluginError::config(format!(
                "setting '{}' must be a positive millisecond count, got {}",
                key, n
            ))),
        }
    }

    /// Reject any settings that were never read by the factory
    ///
    /// Call this after all gets; it turns misspelled settings into startup
    /// errors instead of silent no-ops.
    pub fn finish(self) -> Result<()> {
        let mut unknown: Vec<&str> = self
            .values
            .keys()
            .filter(|k| !self.consumed.contains(*k))
            .map(|k| k.as_str())
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            unknown.sort_unstable();
            Err(PluginError::config(format!(
                "unknown settings: [{}]",
                unknown.join(", ")
            )))
        }
    }
}

fn type_error(key: &str, expected: &str, got: &toml::Value) -> PluginError {
    PluginError::config(format!(
        "setting '{}' must be {}, got {}",
        key,
        expected,
        got.type_str()
    ))
}
