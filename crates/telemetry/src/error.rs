//! Telemetry error types

use thiserror::Error;

/// Errors raised by the telemetry layer
///
/// Telemetry is best-effort: the reporter logs these and keeps going, they
/// never propagate into the pipeline.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Socket I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The statsd host did not resolve
    #[error("cannot resolve statsd host '{0}'")]
    Resolve(String),
}
