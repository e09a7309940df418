//! Stashline - Filter chain
//!
//! Filters transform events in-flight. Every event passes through the same
//! ordered chain, registered once at startup and immutable afterwards.
//! Each filter reads and mutates the event's payload, then returns an
//! explicit verdict:
//!
//! - [`Verdict::Next`] - advance to the next filter (after the last filter,
//!   the event completes)
//! - [`Verdict::Cancel`] - drop the event; remaining filters never run
//! - `Err(FilterError)` - the event becomes errored; remaining filters
//!   never run and the failure is logged with an event snapshot
//!
//! # Design
//!
//! - **Sequential per event**: one event's chain never runs two filters
//!   concurrently, so filters mutate the payload without locking
//! - **Independent across events**: the executor is shared state-free;
//!   chains for different events suspend and resume independently
//! - **Async-capable**: a filter may await external work (a lookup, a
//!   resolver) before returning its verdict
//!
//! # Example
//!
//! ```ignore
//! let chain = Chain::new(vec![
//!     Box::new(FilterFn::new("drop_noise", |event| {
//!         if event.data().contains_key("noise") {
//!             return Ok(Verdict::Cancel);
//!         }
//!         Ok(Verdict::Next)
//!     })),
//! ]);
//!
//! let outcome = chain.run(&mut event).await;
//! ```

mod chain;
mod error;

pub use chain::{Chain, ChainOutcome};
pub use error::{FilterError, FilterResult};

use std::future::Future;
use std::pin::Pin;

use stashline_event::Event;

/// Boxed future returned by filters
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a filter decided about an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Advance to the next filter
    Next,

    /// Drop the event; no further filters run and no output sees it
    Cancel,
}

/// Trait for event filters
///
/// Implementors must be `Send + Sync`: the chain is shared across the
/// pipeline's input lanes and filters may be applied to different events
/// concurrently (never to the same event).
pub trait Filter: Send + Sync {
    /// Name of this filter for logging and diagnostics
    fn name(&self) -> &'static str;

    /// Inspect and possibly mutate the event, then return a verdict
    ///
    /// May suspend on asynchronous work before deciding. Returning an
    /// error aborts the chain and marks the event errored.
    fn apply<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, FilterResult<Verdict>>;
}

/// Adapter turning a synchronous closure into a [`Filter`]
///
/// Most filters are plain payload manipulation; this keeps them free of
/// boxing boilerplate. Async filters implement [`Filter`] directly.
pub struct FilterFn<F> {
    name: &'static str,
    f: F,
}

impl<F> FilterFn<F>
where
    F: Fn(&mut Event) -> FilterResult<Verdict> + Send + Sync,
{
    /// Wrap a closure under a filter name
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Filter for FilterFn<F>
where
    F: Fn(&mut Event) -> FilterResult<Verdict> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, FilterResult<Verdict>> {
        let verdict = (self.f)(event);
        Box::pin(async move { verdict })
    }
}
