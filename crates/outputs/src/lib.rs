//! Stashline - Built-in outputs
//!
//! Output plugins receive ordered batches of completed events. The batch
//! scheduler in the pipeline core owns batching, flush timing, and retries;
//! outputs only implement `write_batch`.
//!
//! Built-ins:
//! - `stdout` - one line per event on standard output
//! - `null` - discards batches, counting what it drops
//!
//! Destination-specific outputs (bulk indexers and the like) are expected
//! to be provided by embedders through the same contract.

mod common;
pub mod null;
pub mod stdout;

pub use common::{OutputMetrics, OutputMetricsSnapshot};
pub use null::{NullOutput, NullOutputFactory};
pub use stdout::{StdoutOutput, StdoutOutputConfig, StdoutOutputFactory};

use stashline_plugin::Registry;

/// Register all built-in output types with a registry
pub fn register_builtins(registry: &mut Registry) {
    registry.register_output(StdoutOutputFactory);
    registry.register_output(NullOutputFactory);
}
