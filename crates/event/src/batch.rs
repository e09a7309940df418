//! Batch - bounded group of completed events bound for one output
//!
//! A batch belongs to exactly one output. It is flushed and replaced by an
//! empty batch either when it reaches the output's batch size or when its
//! flush interval elapses, whichever comes first. The scheduler enforces
//! the size bound; `opened_at` drives the time bound.

use std::time::{Duration, Instant};

use crate::Event;

/// Ordered group of completed events awaiting flush to one output
#[derive(Debug)]
pub struct Batch {
    /// Instance name of the owning output
    output: String,

    /// Events in enqueue order
    items: Vec<Event>,

    /// When the first event was enqueued
    opened_at: Instant,
}

impl Batch {
    /// Create an empty batch for the given output
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            items: Vec::new(),
            opened_at: Instant::now(),
        }
    }

    /// Owning output instance name
    #[inline]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Append an event, resetting `opened_at` if the batch was empty
    pub fn push(&mut self, event: Event) {
        if self.items.is_empty() {
            self.opened_at = Instant::now();
        }
        self.items.push(event);
    }

    /// Number of items in the batch
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch has no items
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in enqueue order
    #[inline]
    pub fn items(&self) -> &[Event] {
        &self.items
    }

    /// Mutable items, for marking after a failed flush
    #[inline]
    pub fn items_mut(&mut self) -> &mut [Event] {
        &mut self.items
    }

    /// Age of the oldest item
    pub fn age(&self) -> Duration {
        if self.items.is_empty() {
            Duration::ZERO
        } else {
            self.opened_at.elapsed()
        }
    }

    /// Deadline after which a non-empty batch must flush
    ///
    /// Returns None for an empty batch (nothing to flush).
    pub fn deadline(&self, flush_interval: Duration) -> Option<Instant> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.opened_at + flush_interval)
        }
    }

    /// Take the items, leaving the batch empty
    pub fn take(&mut self) -> Vec<Event> {
        self.opened_at = Instant::now();
        std::mem::take(&mut self.items)
    }
}
