//! Telemetry sink settings
//!
//! Stashline pushes internal counters to a statsd-compatible endpoint
//! (statsite, statsd). Telemetry is best-effort and out-of-band; disabling
//! it never affects the pipeline.

use serde::Deserialize;

/// `[telemetry]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
    /// Whether telemetry emission is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Metrics endpoint host
    #[serde(default = "default_host")]
    pub host: String,

    /// Metrics endpoint UDP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Emission interval in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Metric name prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8125
}

fn default_interval_secs() -> u64 {
    10
}

fn default_prefix() -> String {
    "stashline".to_string()
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
            interval_secs: default_interval_secs(),
            prefix: default_prefix(),
        }
    }
}
