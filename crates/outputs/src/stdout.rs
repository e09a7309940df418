//! Stdout output - writes completed events to standard output
//!
//! One line per event: the receipt timestamp, producing input, origin, and
//! the payload as compact JSON. Useful for development and as a tap on a
//! live pipeline.

use std::sync::Arc;
use std::time::Duration;

use stashline_event::Event;
use stashline_plugin::{
    OutputFactory, OutputPlugin, PluginDescriptor, PluginError, Result, DEFAULT_BATCH_SIZE,
    DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_RETRIES,
};
use tokio::io::AsyncWriteExt;

use crate::common::OutputMetrics;

/// Stdout output configuration
#[derive(Debug, Clone)]
pub struct StdoutOutputConfig {
    /// Instance name
    pub name: String,

    /// Events per batch
    pub batch_size: usize,

    /// Maximum age of a partial batch before flush
    pub flush_interval: Duration,

    /// Write attempts per batch
    pub max_retries: u32,

    /// Pretty-print payloads instead of compact JSON
    pub pretty: bool,
}

impl Default for StdoutOutputConfig {
    fn default() -> Self {
        Self {
            name: "stdout".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            pretty: false,
        }
    }
}

/// Output that prints events to standard output
pub struct StdoutOutput {
    config: StdoutOutputConfig,
    metrics: Arc<OutputMetrics>,
}

impl StdoutOutput {
    /// Create a new stdout output
    pub fn new(config: StdoutOutputConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(OutputMetrics::new()),
        }
    }

    /// Handle to the output's metrics
    pub fn metrics_handle(&self) -> Arc<OutputMetrics> {
        Arc::clone(&self.metrics)
    }

    fn render(&self, event: &Event) -> String {
        let source = event.source();
        let payload = if self.config.pretty {
            serde_json::to_string_pretty(event.data())
        } else {
            serde_json::to_string(event.data())
        }
        .unwrap_or_else(|_| "<unserializable>".to_string());

        format!(
            "{} {} {} {}",
            source.received_at.to_rfc3339(),
            source.input,
            source.origin.as_deref().unwrap_or("-"),
            payload
        )
    }
}

#[async_trait::async_trait]
impl OutputPlugin for StdoutOutput {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn flush_interval(&self) -> Duration {
        self.config.flush_interval
    }

    fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    async fn write_batch(&mut self, items: &[Event]) -> Result<()> {
        let mut out = String::with_capacity(items.len() * 128);
        for event in items {
            out.push_str(&self.render(event));
            out.push('\n');
        }

        let mut stdout = tokio::io::stdout();
        if let Err(e) = async {
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await
        }
        .await
        {
            self.metrics.write_error();
            return Err(PluginError::Io(e));
        }

        self.metrics.batch_written(items.len() as u64);
        Ok(())
    }
}

/// Factory for the `stdout` output type
pub struct StdoutOutputFactory;

impl OutputFactory for StdoutOutputFactory {
    fn type_name(&self) -> &'static str {
        "stdout"
    }

    fn create(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn OutputPlugin>> {
        let mut settings = descriptor.settings();
        let config = StdoutOutputConfig {
            name: descriptor.name.clone(),
            batch_size: settings
                .get_usize("batch_size")?
                .unwrap_or(DEFAULT_BATCH_SIZE),
            flush_interval: settings
                .get_duration_ms("flush_interval_ms")?
                .unwrap_or(DEFAULT_FLUSH_INTERVAL),
            max_retries: settings
                .get_usize("max_retries")?
                .map(|n| n as u32)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            pretty: settings.get_bool("pretty")?.unwrap_or(false),
        };
        settings.finish()?;

        Ok(Box::new(StdoutOutput::new(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use stashline_event::EventSource;
    use stashline_plugin::PluginKind;

    fn descriptor(settings_toml: &str) -> PluginDescriptor {
        let settings: HashMap<String, toml::Value> = toml::from_str(settings_toml).unwrap();
        PluginDescriptor::new(PluginKind::Output, "stdout", "console", settings)
    }

    #[test]
    fn test_factory_defaults() {
        let output = StdoutOutputFactory.create(&descriptor("")).unwrap();
        assert_eq!(output.name(), "console");
        assert_eq!(output.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(output.flush_interval(), DEFAULT_FLUSH_INTERVAL);
        assert_eq!(output.max_retries(), DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_factory_overrides() {
        let output = StdoutOutputFactory
            .create(&descriptor(
                "batch_size = 500\nflush_interval_ms = 250\nmax_retries = 5",
            ))
            .unwrap();
        assert_eq!(output.batch_size(), 500);
        assert_eq!(output.flush_interval(), Duration::from_millis(250));
        assert_eq!(output.max_retries(), 5);
    }

    #[test]
    fn test_factory_rejects_zero_batch_size() {
        let err = StdoutOutputFactory
            .create(&descriptor("batch_size = 0"))
            .map(|_| ())
            .unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn test_render_line_shape() {
        let output = StdoutOutput::new(StdoutOutputConfig::default());
        let event = Event::from_line(
            EventSource::now("syslog", Some("10.0.0.1:4901".into())),
            "hello",
        );

        let line = output.render(&event);
        assert!(line.contains(" syslog 10.0.0.1:4901 "));
        assert!(line.ends_with(r#"{"message":"hello"}"#));
    }

    #[tokio::test]
    async fn test_write_batch_counts_events() {
        let mut output = StdoutOutput::new(StdoutOutputConfig::default());
        let metrics = output.metrics_handle();

        let items = vec![
            Event::from_line(EventSource::now("tcp", None), "a"),
            Event::from_line(EventSource::now("tcp", None), "b"),
        ];
        output.write_batch(&items).await.unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches_written, 1);
        assert_eq!(snapshot.events_written, 2);
    }
}
