//! Stashline - Built-in inputs
//!
//! Input plugins produce events from live streams. The pipeline core only
//! sees the `InputPlugin` capability contract; everything protocol-specific
//! lives here.
//!
//! Built-ins:
//! - `tcp` - line-delimited TCP listener; each received line becomes one
//!   event with the raw text in `data["message"]`
//!
//! Protocol-heavy inputs (RELP and friends) are expected to be provided by
//! embedders through the same contract.

mod common;
pub mod tcp;

pub use common::{InputMetrics, InputMetricsSnapshot};
pub use tcp::{TcpInput, TcpInputConfig, TcpInputFactory};

use stashline_plugin::Registry;

/// Register all built-in input types with a registry
pub fn register_builtins(registry: &mut Registry) {
    registry.register_input(TcpInputFactory);
}
