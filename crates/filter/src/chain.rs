//! Chain - sequential filter execution with explicit outcomes
//!
//! The `Chain` runs registered filters in order over one event and reports
//! how the event left the chain. Execution is sequential within an event
//! and stops at the first cancel or error.

use stashline_event::Event;

use crate::{Filter, FilterError, Verdict};

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;

/// How an event left the filter chain
#[derive(Debug)]
pub enum ChainOutcome {
    /// Every filter returned `Next`; the event is eligible for batching
    Completed,

    /// A filter cancelled the event
    Cancelled {
        /// Name of the cancelling filter
        filter: &'static str,
    },

    /// A filter failed; the event is errored
    Errored {
        /// Name of the failing filter
        filter: &'static str,
        /// The failure
        error: FilterError,
    },
}

/// Ordered, immutable chain of filters
///
/// Built once at startup; execution order is registration order, globally,
/// for every event. An empty chain completes every event untouched.
pub struct Chain {
    filters: Vec<Box<dyn Filter>>,
}

impl Chain {
    /// Create a chain from filters in registration order
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }

    /// Create an empty pass-through chain
    pub fn empty() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Number of registered filters
    #[inline]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no filters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Names of all registered filters, in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run the chain over one event
    ///
    /// Marks the event `InFilterChain`, executes filters in order, and
    /// leaves the event in the terminal state matching the outcome. A
    /// cancelling filter short-circuits: filters after it never run for
    /// this event. A failing filter is logged with an event snapshot so
    /// the bad event can be diagnosed without restarting the pipeline.
    pub async fn run(&self, event: &mut Event) -> ChainOutcome {
        event.mark_filtering();

        for filter in &self.filters {
            match filter.apply(event).await {
                Ok(Verdict::Next) => {}
                Ok(Verdict::Cancel) => {
                    event.mark_cancelled();
                    tracing::trace!(filter = filter.name(), "event cancelled");
                    return ChainOutcome::Cancelled {
                        filter: filter.name(),
                    };
                }
                Err(error) => {
                    event.mark_errored();
                    tracing::warn!(
                        filter = filter.name(),
                        error = %error,
                        event = %event.snapshot(),
                        "filter failed, event errored"
                    );
                    return ChainOutcome::Errored {
                        filter: filter.name(),
                        error,
                    };
                }
            }
        }

        event.mark_completed();
        ChainOutcome::Completed
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain").field("filters", &self.names()).finish()
    }
}
