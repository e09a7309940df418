//! Stashline - Pipeline core
//!
//! The engine that moves events from inputs, through the filter chain, to
//! batched outputs. Plugins are opaque trait objects; this crate owns the
//! accounting and scheduling around them.
//!
//! # Architecture
//!
//! ```text
//! inputs --admit--> per-input lanes --chain--> batch schedulers --flush--> outputs
//!    ^                                                |
//!    +---- pause/resume watch ---- governor <--release+
//! ```
//!
//! # Design
//!
//! - **One governor**: a single in-flight counter with high/low watermarks
//!   decides pause and resume for every input at once
//! - **Per-input lanes**: each input's events run the chain sequentially,
//!   preserving arrival order per input; lanes for different inputs run
//!   concurrently
//! - **Per-output schedulers**: each output owns its batch, its flush
//!   deadline, and its retry budget; a dead destination poisons its own
//!   batches without touching the others
//! - **Exact release accounting**: every admitted event copy is released
//!   exactly once, whether it is flushed, cancelled, errored, or poisoned,
//!   so `in_flight` always drains back to zero

mod batcher;
mod coordinator;
mod error;
mod governor;
mod metrics;

pub use coordinator::Coordinator;
pub use error::PipelineError;
pub use governor::Governor;
pub use metrics::{PipelineMetrics, PipelineMetricsSnapshot};
