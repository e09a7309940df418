//! Backpressure governor - global in-flight accounting with watermarks
//!
//! The governor counts every event that has been produced but not yet
//! released (flushed, cancelled, or errored). Crossing the high watermark
//! pauses all inputs via a broadcast watch channel; draining back to the
//! low watermark resumes them. There is exactly one governor per pipeline,
//! shared by every input and every batch scheduler.
//!
//! # Design
//!
//! - **Single choke point**: count and pause flag live under one mutex, so
//!   pause/resume transitions are decided atomically with the count change
//! - **Broadcast, not polling**: inputs subscribe to a `watch` channel and
//!   park in `wait_resumed()`; the governor only touches the channel on an
//!   actual transition
//! - **Pause is cooperative**: events already in flight when the pause
//!   fires are still admitted and counted; a rate-limited warning surfaces
//!   sustained overshoot

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use stashline_plugin::Admission;
use tokio::sync::watch;

use crate::PipelineMetrics;

/// Warn at most once per interval about events admitted while paused
const OVERFLOW_LOG_INTERVAL_MS: u64 = 1000;

struct State {
    in_flight: u64,
    paused: bool,
}

/// Watermark-based backpressure governor
pub struct Governor {
    high: u64,
    low: u64,
    state: Mutex<State>,
    pause_tx: watch::Sender<bool>,
    overflow: OverflowTracker,
    metrics: Arc<PipelineMetrics>,
}

impl Governor {
    /// Create a governor with the given watermarks
    ///
    /// `low` must be below `high`; configuration validation enforces this
    /// before the pipeline is built.
    pub fn new(high: u64, low: u64, metrics: Arc<PipelineMetrics>) -> Self {
        debug_assert!(low < high, "low watermark must be below high");
        let (pause_tx, _) = watch::channel(false);
        Self {
            high,
            low,
            state: Mutex::new(State {
                in_flight: 0,
                paused: false,
            }),
            pause_tx,
            overflow: OverflowTracker::new(),
            metrics,
        }
    }

    /// Subscribe to the pause signal
    ///
    /// The receiver holds `true` while inputs should stop producing.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.pause_tx.subscribe()
    }

    /// Count one produced event
    ///
    /// Pauses inputs when the count reaches the high watermark.
    pub fn admit(&self) {
        let mut state = self.state.lock();
        state.in_flight += 1;

        if state.paused {
            drop(state);
            self.overflow.record();
            return;
        }

        if state.in_flight >= self.high {
            state.paused = true;
            let in_flight = state.in_flight;
            // Publish under the lock: a racing release must not get its
            // resume onto the channel ahead of this pause
            let _ = self.pause_tx.send(true);
            drop(state);

            self.metrics.record_pause();
            tracing::warn!(
                in_flight,
                high_watermark = self.high,
                "high watermark reached, pausing inputs"
            );
        }
    }

    /// Release one event that reached a terminal state
    ///
    /// Resumes inputs when a paused pipeline drains to the low watermark.
    pub fn release(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.in_flight > 0, "release without matching admit");
        state.in_flight = state.in_flight.saturating_sub(1);

        if state.paused && state.in_flight <= self.low {
            state.paused = false;
            let in_flight = state.in_flight;
            let _ = self.pause_tx.send(false);
            drop(state);

            self.metrics.record_resume();
            tracing::info!(
                in_flight,
                low_watermark = self.low,
                "drained to low watermark, resuming inputs"
            );
        }
    }

    /// Current number of in-flight events
    pub fn in_flight(&self) -> u64 {
        self.state.lock().in_flight
    }

    /// Whether inputs are currently paused
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }
}

impl Admission for Governor {
    fn admit(&self) {
        Governor::admit(self)
    }
}

impl std::fmt::Debug for Governor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Governor")
            .field("high", &self.high)
            .field("low", &self.low)
            .field("in_flight", &state.in_flight)
            .field("paused", &state.paused)
            .finish()
    }
}

/// Rate-limited logging for events admitted while paused
///
/// Inputs stop at their next production point, so a bounded overshoot is
/// expected. Sustained overshoot means an input is ignoring the pause
/// signal; one aggregated warning per second keeps that visible without
/// log spam.
struct OverflowTracker {
    interval_count: AtomicU64,
    last_log_ms: AtomicU64,
}

impl OverflowTracker {
    fn new() -> Self {
        Self {
            interval_count: AtomicU64::new(0),
            last_log_ms: AtomicU64::new(Self::now_ms()),
        }
    }

    fn record(&self) {
        self.interval_count.fetch_add(1, Ordering::Relaxed);

        let now = Self::now_ms();
        let last = self.last_log_ms.load(Ordering::Relaxed);
        if now.saturating_sub(last) < OVERFLOW_LOG_INTERVAL_MS {
            return;
        }

        // Claim the log slot to avoid duplicate logs from concurrent calls
        if self
            .last_log_ms
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let count = self.interval_count.swap(0, Ordering::Relaxed);
        if count > 0 {
            tracing::warn!(
                admitted_while_paused = count,
                "events admitted while paused in last second"
            );
        }
    }

    #[inline]
    fn now_ms() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
