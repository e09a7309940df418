//! Pipeline coordinator - wires inputs, lanes, and batch schedulers
//!
//! The coordinator owns startup order, the event path, and shutdown:
//!
//! 1. Batch schedulers start first, one task per output, so a completed
//!    event never waits on a missing consumer
//! 2. Each input gets its own channel and lane task. A lane runs the
//!    filter chain sequentially over its input's events, which preserves
//!    arrival order per input while chains for different inputs interleave
//! 3. Completed events fan out to every output's scheduler; cancelled and
//!    errored events are released from backpressure accounting on the spot
//!
//! Shutdown cascades: cancelling the token stops inputs, which closes the
//! lane channels, which closes the scheduler channels, which triggers the
//! final flush of every open batch. `run` returns once all of that is done.

use std::sync::Arc;

use stashline_event::Event;
use stashline_filter::{Chain, ChainOutcome};
use stashline_plugin::{EventSender, InputContext, InputPlugin, OutputPlugin};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::batcher::Batcher;
use crate::{Governor, PipelineError, PipelineMetrics};

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;

/// Capacity of each input's event channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Capacity of each output's batch scheduler channel
const BATCH_CHANNEL_CAPACITY: usize = 1024;

/// Owns the pipeline's plugins and runs them to completion
pub struct Coordinator {
    chain: Arc<Chain>,
    governor: Arc<Governor>,
    metrics: Arc<PipelineMetrics>,
    inputs: Vec<Box<dyn InputPlugin>>,
    outputs: Vec<Box<dyn OutputPlugin>>,
}

impl Coordinator {
    /// Create a coordinator with the given watermarks and filter chain
    pub fn new(high_watermark: u64, low_watermark: u64, chain: Chain) -> Self {
        let metrics = Arc::new(PipelineMetrics::new());
        let governor = Arc::new(Governor::new(high_watermark, low_watermark, metrics.clone()));
        Self {
            chain: Arc::new(chain),
            governor,
            metrics,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add an input instance
    pub fn add_input(&mut self, input: Box<dyn InputPlugin>) {
        self.inputs.push(input);
    }

    /// Add an output instance
    pub fn add_output(&mut self, output: Box<dyn OutputPlugin>) {
        self.outputs.push(output);
    }

    /// Handle to the pipeline metrics, valid after `run()` consumes self
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle to the backpressure governor
    pub fn governor(&self) -> Arc<Governor> {
        Arc::clone(&self.governor)
    }

    /// Run the pipeline until every input has exited
    ///
    /// Inputs exit when `shutdown` is cancelled or on their own (a failed
    /// input cancels the token for the others). The first input error is
    /// returned after the pipeline has fully drained.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), PipelineError> {
        let Self {
            chain,
            governor,
            metrics,
            inputs,
            outputs,
        } = self;

        if outputs.is_empty() {
            tracing::warn!("no outputs configured, completed events are discarded");
        }

        // Schedulers first
        let mut batch_txs = Vec::with_capacity(outputs.len());
        let mut batcher_tasks = Vec::with_capacity(outputs.len());
        for output in outputs {
            let (tx, rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
            tracing::info!(
                output = output.name(),
                batch_size = output.batch_size(),
                "starting batch scheduler"
            );
            batcher_tasks.push(tokio::spawn(
                Batcher::new(output, rx, governor.clone(), metrics.clone()).run(),
            ));
            batch_txs.push(tx);
        }

        let mut input_tasks = Vec::with_capacity(inputs.len());
        let mut lane_tasks = Vec::with_capacity(inputs.len());
        for input in inputs {
            let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
            let ctx = InputContext {
                events: EventSender::new(tx, governor.clone()),
                pause: governor.subscribe(),
                shutdown: shutdown.child_token(),
            };

            let name = input.name().to_string();
            tracing::info!(input = %name, "starting input");
            let shutdown = shutdown.clone();
            input_tasks.push(tokio::spawn(async move {
                let result = input.run(ctx).await;
                if let Err(ref e) = result {
                    tracing::error!(input = %name, error = %e, "input failed, shutting down pipeline");
                    shutdown.cancel();
                }
                result
            }));

            lane_tasks.push(tokio::spawn(run_lane(
                rx,
                chain.clone(),
                governor.clone(),
                metrics.clone(),
                batch_txs.clone(),
            )));
        }

        // The lanes hold their own clones; dropping ours lets the scheduler
        // channels close once the lanes finish
        drop(batch_txs);

        let mut first_error = None;
        for task in input_tasks {
            if let Err(e) = task.await? {
                first_error.get_or_insert(PipelineError::Plugin(e));
            }
        }
        for task in lane_tasks {
            task.await?;
        }
        for task in batcher_tasks {
            task.await?;
        }

        tracing::info!(in_flight = governor.in_flight(), "pipeline stopped");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Drive one input's events through the chain, in arrival order
async fn run_lane(
    mut rx: mpsc::Receiver<Event>,
    chain: Arc<Chain>,
    governor: Arc<Governor>,
    metrics: Arc<PipelineMetrics>,
    outputs: Vec<mpsc::Sender<Event>>,
) {
    while let Some(mut event) = rx.recv().await {
        metrics.record_received();

        match chain.run(&mut event).await {
            ChainOutcome::Completed => {
                metrics.record_completed();
                dispatch(event, &governor, &outputs).await;
            }
            ChainOutcome::Cancelled { .. } => {
                metrics.record_cancelled();
                governor.release();
            }
            ChainOutcome::Errored { .. } => {
                metrics.record_errored();
                governor.release();
            }
        }
    }
}

/// Hand a completed event to every output's scheduler
///
/// The event was admitted once at production; each additional output copy
/// gets its own admit so every scheduler releases exactly the copies it
/// consumed. With no outputs the event is released immediately.
async fn dispatch(event: Event, governor: &Governor, outputs: &[mpsc::Sender<Event>]) {
    let Some((last, rest)) = outputs.split_last() else {
        governor.release();
        return;
    };

    for _ in 0..rest.len() {
        governor.admit();
    }
    for tx in rest {
        if tx.send(event.clone()).await.is_err() {
            // Scheduler gone during teardown; drop our copy cleanly
            governor.release();
        }
    }
    if last.send(event).await.is_err() {
        governor.release();
    }
}
