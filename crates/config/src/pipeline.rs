//! Pipeline-wide settings: the backpressure watermarks

use serde::Deserialize;

use crate::{ConfigError, Result};

/// Default in-flight event count that pauses inputs
pub const DEFAULT_HIGH_WATERMARK: u64 = 30_000;

/// `[pipeline]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// In-flight event count that triggers an input pause
    #[serde(default = "default_high_watermark")]
    pub high_watermark: u64,

    /// In-flight count at or below which paused inputs resume
    ///
    /// Defaults to `high_watermark - 1`: resume as soon as the count drops
    /// strictly below the high watermark. Set lower for wider hysteresis
    /// when pause/resume oscillation is a concern.
    #[serde(default)]
    pub low_watermark: Option<u64>,
}

fn default_high_watermark() -> u64 {
    DEFAULT_HIGH_WATERMARK
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            high_watermark: DEFAULT_HIGH_WATERMARK,
            low_watermark: None,
        }
    }
}

impl PipelineSection {
    /// The effective resume threshold
    pub fn low_watermark(&self) -> u64 {
        self.low_watermark
            .unwrap_or_else(|| self.high_watermark.saturating_sub(1))
    }

    /// Validate watermark sanity
    pub fn validate(&self) -> Result<()> {
        if self.high_watermark == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline",
                "pipeline",
                "high_watermark",
                "must be positive",
            ));
        }
        if let Some(low) = self.low_watermark {
            if low >= self.high_watermark {
                return Err(ConfigError::invalid_value(
                    "pipeline",
                    "pipeline",
                    "low_watermark",
                    format!(
                        "must be below high_watermark ({} >= {})",
                        low, self.high_watermark
                    ),
                ));
            }
        }
        Ok(())
    }
}
