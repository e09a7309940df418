//! Shared input plumbing
//!
//! Metrics counters common to all input types. Counters are lock-free and
//! cheap to bump from connection handler tasks; snapshots are taken by the
//! telemetry reporter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by all input types
#[derive(Debug, Default)]
pub struct InputMetrics {
    /// Currently active connections
    pub connections_active: AtomicU64,

    /// Total connections accepted
    pub connections_total: AtomicU64,

    /// Total events produced into the pipeline
    pub events_produced: AtomicU64,

    /// Total bytes read off the wire
    pub bytes_received: AtomicU64,

    /// Total errors encountered
    pub errors: AtomicU64,
}

impl InputMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            events_produced: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Increment active connections
    #[inline]
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement active connections
    #[inline]
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record one produced event and the bytes it came from
    #[inline]
    pub fn event_produced(&self, bytes: u64) {
        self.events_produced.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an error
    #[inline]
    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> InputMetricsSnapshot {
        InputMetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            events_produced: self.events_produced.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of input metrics
#[derive(Debug, Clone, Copy)]
pub struct InputMetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub events_produced: u64,
    pub bytes_received: u64,
    pub errors: u64,
}
