//! Pipeline metrics
//!
//! Atomic counters for the event path and the batch scheduler. All
//! operations use relaxed ordering; values are eventually consistent, not
//! real-time. The telemetry reporter diffs counter values between
//! intervals to produce per-interval counts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for the whole pipeline
///
/// Safe to bump from any task; one instance is shared by the governor, the
/// input lanes, and every batch scheduler.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Events produced by inputs
    events_received: AtomicU64,

    /// Events that survived the full filter chain
    events_completed: AtomicU64,

    /// Events cancelled by a filter
    events_cancelled: AtomicU64,

    /// Events errored (filter failure or poison batch)
    events_errored: AtomicU64,

    /// Batches flushed successfully
    batches_flushed: AtomicU64,

    /// Events delivered inside flushed batches
    events_flushed: AtomicU64,

    /// Failed write attempts (each attempt counts)
    flush_failures: AtomicU64,

    /// Write attempts that were retries of an earlier failure
    flush_retries: AtomicU64,

    /// Batches dropped after exhausting their retry budget
    batches_poisoned: AtomicU64,

    /// Total time spent in successful flushes, in nanoseconds
    flush_duration_ns: AtomicU64,

    /// Times the governor paused inputs
    pause_events: AtomicU64,

    /// Times the governor resumed inputs
    resume_events: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            events_completed: AtomicU64::new(0),
            events_cancelled: AtomicU64::new(0),
            events_errored: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            events_flushed: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
            flush_retries: AtomicU64::new(0),
            batches_poisoned: AtomicU64::new(0),
            flush_duration_ns: AtomicU64::new(0),
            pause_events: AtomicU64::new(0),
            resume_events: AtomicU64::new(0),
        }
    }

    /// Record an event produced by an input
    #[inline]
    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event that completed the filter chain
    #[inline]
    pub fn record_completed(&self) {
        self.events_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event cancelled by a filter
    #[inline]
    pub fn record_cancelled(&self) {
        self.events_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an errored event
    #[inline]
    pub fn record_errored(&self) {
        self.events_errored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful batch flush
    #[inline]
    pub fn record_batch_flushed(&self, events: u64, duration: Duration) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.events_flushed.fetch_add(events, Ordering::Relaxed);
        self.flush_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a failed write attempt
    #[inline]
    pub fn record_flush_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a retry of a failed write
    #[inline]
    pub fn record_flush_retry(&self) {
        self.flush_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch dropped after exhausting its retries
    #[inline]
    pub fn record_batch_poisoned(&self, events: u64) {
        self.batches_poisoned.fetch_add(1, Ordering::Relaxed);
        self.events_errored.fetch_add(events, Ordering::Relaxed);
    }

    /// Record a pause transition
    #[inline]
    pub fn record_pause(&self) {
        self.pause_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a resume transition
    #[inline]
    pub fn record_resume(&self) {
        self.resume_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all counters
    #[inline]
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_completed: self.events_completed.load(Ordering::Relaxed),
            events_cancelled: self.events_cancelled.load(Ordering::Relaxed),
            events_errored: self.events_errored.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            events_flushed: self.events_flushed.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            flush_retries: self.flush_retries.load(Ordering::Relaxed),
            batches_poisoned: self.batches_poisoned.load(Ordering::Relaxed),
            flush_duration_ns: self.flush_duration_ns.load(Ordering::Relaxed),
            pause_events: self.pause_events.load(Ordering::Relaxed),
            resume_events: self.resume_events.load(Ordering::Relaxed),
        }
    }

}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineMetricsSnapshot {
    pub events_received: u64,
    pub events_completed: u64,
    pub events_cancelled: u64,
    pub events_errored: u64,
    pub batches_flushed: u64,
    pub events_flushed: u64,
    pub flush_failures: u64,
    pub flush_retries: u64,
    pub batches_poisoned: u64,
    pub flush_duration_ns: u64,
    pub pause_events: u64,
    pub resume_events: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_path_counters() {
        let metrics = PipelineMetrics::new();

        metrics.record_received();
        metrics.record_received();
        metrics.record_completed();
        metrics.record_cancelled();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_received, 2);
        assert_eq!(snapshot.events_completed, 1);
        assert_eq!(snapshot.events_cancelled, 1);
        assert_eq!(snapshot.events_errored, 0);
    }

    #[test]
    fn test_flush_counters() {
        let metrics = PipelineMetrics::new();

        metrics.record_batch_flushed(500, Duration::from_millis(3));
        metrics.record_flush_failure();
        metrics.record_flush_retry();
        metrics.record_batch_flushed(42, Duration::from_millis(1));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_flushed, 2);
        assert_eq!(snapshot.events_flushed, 542);
        assert_eq!(snapshot.flush_failures, 1);
        assert_eq!(snapshot.flush_retries, 1);
        assert_eq!(snapshot.flush_duration_ns, 4_000_000);
    }

    #[test]
    fn test_poisoned_batch_errors_its_events() {
        let metrics = PipelineMetrics::new();

        metrics.record_batch_poisoned(7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_poisoned, 1);
        assert_eq!(snapshot.events_errored, 7);
    }

    #[test]
    fn test_fresh_snapshot_is_zero() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.snapshot(), PipelineMetricsSnapshot::default());
    }
}
