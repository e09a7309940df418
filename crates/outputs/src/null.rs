//! Null output - discards everything it receives
//!
//! Counts what it drops. Used for load testing and for draining a pipeline
//! whose real destination is down.

use std::sync::Arc;
use std::time::Duration;

use stashline_event::Event;
use stashline_plugin::{
    OutputFactory, OutputPlugin, PluginDescriptor, Result, DEFAULT_BATCH_SIZE,
    DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_RETRIES,
};

use crate::common::OutputMetrics;

/// Output that drops every batch
pub struct NullOutput {
    name: String,
    batch_size: usize,
    flush_interval: Duration,
    metrics: Arc<OutputMetrics>,
}

impl NullOutput {
    /// Create a new null output
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            metrics: Arc::new(OutputMetrics::new()),
        }
    }

    /// Handle to the output's metrics
    pub fn metrics_handle(&self) -> Arc<OutputMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[async_trait::async_trait]
impl OutputPlugin for NullOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    fn max_retries(&self) -> u32 {
        DEFAULT_MAX_RETRIES
    }

    async fn write_batch(&mut self, items: &[Event]) -> Result<()> {
        self.metrics.batch_written(items.len() as u64);
        Ok(())
    }
}

/// Factory for the `null` output type
pub struct NullOutputFactory;

impl OutputFactory for NullOutputFactory {
    fn type_name(&self) -> &'static str {
        "null"
    }

    fn create(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn OutputPlugin>> {
        let mut settings = descriptor.settings();
        let mut output = NullOutput::new(descriptor.name.clone());
        if let Some(batch_size) = settings.get_usize("batch_size")? {
            output.batch_size = batch_size;
        }
        if let Some(interval) = settings.get_duration_ms("flush_interval_ms")? {
            output.flush_interval = interval;
        }
        settings.finish()?;

        Ok(Box::new(output))
    }
}
