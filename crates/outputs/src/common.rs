//! Shared output plumbing

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics shared by all output types
#[derive(Debug, Default)]
pub struct OutputMetrics {
    /// Total batches written successfully
    pub batches_written: AtomicU64,

    /// Total events written successfully
    pub events_written: AtomicU64,

    /// Total failed write attempts
    pub write_errors: AtomicU64,
}

impl OutputMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            batches_written: AtomicU64::new(0),
            events_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record a successful batch write
    #[inline]
    pub fn batch_written(&self, events: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.events_written.fetch_add(events, Ordering::Relaxed);
    }

    /// Record a failed write attempt
    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> OutputMetricsSnapshot {
        OutputMetricsSnapshot {
            batches_written: self.batches_written.load(Ordering::Relaxed),
            events_written: self.events_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of output metrics
#[derive(Debug, Clone, Copy)]
pub struct OutputMetricsSnapshot {
    pub batches_written: u64,
    pub events_written: u64,
    pub write_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_tracking() {
        let metrics = OutputMetrics::new();

        metrics.batch_written(500);
        metrics.batch_written(42);
        metrics.write_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_written, 2);
        assert_eq!(snapshot.events_written, 542);
        assert_eq!(snapshot.write_errors, 1);
    }
}
