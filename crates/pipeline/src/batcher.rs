//! Batch scheduler - per-output batching, flush timing, and retries
//!
//! Each output gets one scheduler task that owns the output instance and
//! its current open batch. Events arrive over a channel in completion
//! order; the batch flushes when it reaches the output's batch size or
//! when its oldest event exceeds the flush interval, whichever comes
//! first. Failed writes retry the whole batch with exponential backoff;
//! a batch that exhausts its retry budget is dropped as poison so one bad
//! destination cannot wedge the pipeline.
//!
//! Every event leaving the scheduler, delivered or poisoned, is released
//! from backpressure accounting exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use stashline_event::Batch;
use stashline_plugin::OutputPlugin;
use tokio::sync::mpsc;

use crate::{Governor, PipelineMetrics};

#[cfg(test)]
#[path = "batcher_test.rs"]
mod tests;

/// Delay before the first retry; doubles per attempt
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Upper bound on the retry delay
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Scheduler task state for one output
pub(crate) struct Batcher {
    output: Box<dyn OutputPlugin>,
    rx: mpsc::Receiver<stashline_event::Event>,
    governor: Arc<Governor>,
    metrics: Arc<PipelineMetrics>,
}

impl Batcher {
    pub(crate) fn new(
        output: Box<dyn OutputPlugin>,
        rx: mpsc::Receiver<stashline_event::Event>,
        governor: Arc<Governor>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            output,
            rx,
            governor,
            metrics,
        }
    }

    /// Run until the upstream channel closes, then flush what remains
    pub(crate) async fn run(mut self) {
        let batch_size = self.output.batch_size().max(1);
        let flush_interval = self.output.flush_interval();
        let name = self.output.name().to_string();
        let mut batch = Batch::new(name.clone());

        loop {
            let received = {
                let deadline = batch.deadline(flush_interval);
                tokio::select! {
                    maybe = self.rx.recv() => match maybe {
                        Some(event) => Some(event),
                        None => break,
                    },
                    _ = deadline_sleep(deadline), if deadline.is_some() => None,
                }
            };

            match received {
                Some(event) => {
                    batch.push(event);
                    if batch.len() >= batch_size {
                        self.flush(&mut batch).await;
                    }
                }
                // Deadline fired: the oldest event has waited long enough
                None => self.flush(&mut batch).await,
            }
        }

        // Upstream gone: drain the open batch before exiting
        self.flush(&mut batch).await;
        tracing::debug!(output = %name, "batch scheduler stopped");
    }

    /// Write the open batch, retrying with backoff, then release its events
    async fn flush(&mut self, batch: &mut Batch) {
        if batch.is_empty() {
            return;
        }

        let mut items = batch.take();
        let max_retries = self.output.max_retries().max(1);
        let start = Instant::now();
        let mut delay = RETRY_BASE_DELAY;

        for attempt in 1..=max_retries {
            match self.output.write_batch(&items).await {
                Ok(()) => {
                    self.metrics
                        .record_batch_flushed(items.len() as u64, start.elapsed());
                    tracing::debug!(
                        output = self.output.name(),
                        events = items.len(),
                        attempt,
                        "batch flushed"
                    );
                    for _ in 0..items.len() {
                        self.governor.release();
                    }
                    return;
                }
                Err(e) => {
                    self.metrics.record_flush_failure();
                    if attempt == max_retries {
                        tracing::error!(
                            output = self.output.name(),
                            events = items.len(),
                            attempts = attempt,
                            error = %e,
                            "retries exhausted, dropping poison batch"
                        );
                        self.metrics.record_batch_poisoned(items.len() as u64);
                        for item in items.iter_mut() {
                            item.mark_errored();
                        }
                        for _ in 0..items.len() {
                            self.governor.release();
                        }
                        return;
                    }

                    self.metrics.record_flush_retry();
                    tracing::warn!(
                        output = self.output.name(),
                        attempt,
                        error = %e,
                        "batch write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(RETRY_MAX_DELAY);
                }
            }
        }
    }
}

async fn deadline_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}
