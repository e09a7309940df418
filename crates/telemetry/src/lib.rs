//! Stashline - Telemetry
//!
//! Best-effort metrics reporting to a statsd-compatible aggregator over
//! UDP. A background reporter task snapshots registered stat sources every
//! interval, diffs cumulative counters, and emits counts and gauges in
//! packed datagrams.
//!
//! # Design
//!
//! - **Never blocks the pipeline**: the reporter runs in its own task and
//!   swallows every failure after logging it
//! - **Deltas, not totals**: sources expose cumulative counters; the
//!   reporter sends per-interval differences, which is what statsd counts
//!   expect
//! - **Cheap when disabled**: a disabled reporter exits before opening a
//!   socket

mod error;
mod reporter;
mod statsd;

pub use error::TelemetryError;
pub use reporter::{spawn, Reporter, ReporterConfig, StatsSource};
pub use statsd::StatsdClient;
