//! Stashline - Event model
//!
//! The `Event` is the unit of data flowing through the pipeline: a mutable
//! JSON payload plus immutable receipt metadata set by the originating
//! input. Events move through a small lifecycle state machine and end in
//! exactly one terminal state.
//!
//! ```text
//! Pending → InFilterChain → { Completed | Cancelled | Errored }
//! ```
//!
//! `Batch` groups completed events bound for one output so the output can
//! receive them in a single bulk write.

mod batch;
mod event;

pub use batch::Batch;
pub use event::{Event, EventSource, EventState};
