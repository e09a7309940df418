//! Stashline - pluggable in-memory event pipeline
//!
//! Events flow from input plugins, through an ordered filter chain, into
//! per-output batch schedulers, with a watermark governor pausing inputs
//! when too much is in flight. This crate ties the workspace together:
//! a builder facade over the pipeline core, the built-in plugin registry,
//! and the statsd telemetry bridge.
//!
//! # Example
//!
//! ```ignore
//! let config = Config::from_file("configs/stashline.toml")?;
//! let pipeline = PipelineBuilder::from_config(config)
//!     .add_filter(Box::new(StripServicePid::new()))
//!     .build()?;
//! pipeline.run(shutdown).await?;
//! ```

pub mod filters;

pub use filters::StripServicePid;
pub use stashline_config::Config;
pub use stashline_event::{Event, EventSource, EventState};
pub use stashline_filter::{Chain, Filter, FilterFn, Verdict};
pub use stashline_pipeline::{Coordinator, PipelineError, PipelineMetrics};
pub use stashline_plugin::{
    InputPlugin, OutputPlugin, PluginDescriptor, PluginError, PluginKind, Registry,
};
pub use stashline_telemetry::ReporterConfig;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use stashline_pipeline::Governor;
use stashline_telemetry::StatsSource;
use tokio_util::sync::CancellationToken;

/// A registry with every built-in input and output type
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    stashline_inputs::register_builtins(&mut registry);
    stashline_outputs::register_builtins(&mut registry);
    registry
}

/// Builder facade over the pipeline core
///
/// Collects watermarks, telemetry settings, plugin descriptors, and
/// filters, then instantiates everything through the registry. Filters
/// are code, not configuration, so they are always added here even when
/// the rest comes from a config file.
pub struct PipelineBuilder {
    registry: Registry,
    high_watermark: u64,
    low_watermark: Option<u64>,
    telemetry: ReporterConfig,
    filters: Vec<Box<dyn Filter>>,
    inputs: Vec<PluginDescriptor>,
    outputs: Vec<PluginDescriptor>,
}

impl PipelineBuilder {
    /// Start from defaults and the built-in registry
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    /// Start from defaults and a caller-provided registry
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            high_watermark: stashline_config::DEFAULT_HIGH_WATERMARK,
            low_watermark: None,
            telemetry: ReporterConfig::default(),
            filters: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Seed the builder from a validated configuration file
    pub fn from_config(config: Config) -> Self {
        let mut builder = Self::new();
        builder.high_watermark = config.pipeline.high_watermark;
        builder.low_watermark = config.pipeline.low_watermark;
        builder.telemetry = ReporterConfig {
            enabled: config.telemetry.enabled,
            host: config.telemetry.host,
            port: config.telemetry.port,
            interval: Duration::from_secs(config.telemetry.interval_secs),
            prefix: config.telemetry.prefix,
        };
        for section in config.inputs {
            builder.inputs.push(PluginDescriptor::new(
                PluginKind::Input,
                section.type_name.clone(),
                section.instance_name().to_string(),
                section.settings,
            ));
        }
        for section in config.outputs {
            builder.outputs.push(PluginDescriptor::new(
                PluginKind::Output,
                section.type_name.clone(),
                section.instance_name().to_string(),
                section.settings,
            ));
        }
        builder
    }

    /// In-flight event count that pauses inputs
    pub fn high_watermark(mut self, high: u64) -> Self {
        self.high_watermark = high;
        self
    }

    /// In-flight count at which paused inputs resume
    pub fn low_watermark(mut self, low: u64) -> Self {
        self.low_watermark = Some(low);
        self
    }

    /// Enable statsd telemetry to the given aggregator
    pub fn telemetry(mut self, host: impl Into<String>, port: u16) -> Self {
        self.telemetry.enabled = true;
        self.telemetry.host = host.into();
        self.telemetry.port = port;
        self
    }

    /// Append a filter; execution order is registration order
    pub fn add_filter(mut self, filter: Box<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add an input instance of a registered type
    pub fn add_input(
        mut self,
        type_name: impl Into<String>,
        settings: HashMap<String, toml::Value>,
    ) -> Self {
        let type_name = type_name.into();
        self.inputs.push(PluginDescriptor::new(
            PluginKind::Input,
            type_name.clone(),
            type_name,
            settings,
        ));
        self
    }

    /// Add an output instance of a registered type
    pub fn add_output(
        mut self,
        type_name: impl Into<String>,
        settings: HashMap<String, toml::Value>,
    ) -> Self {
        let type_name = type_name.into();
        self.outputs.push(PluginDescriptor::new(
            PluginKind::Output,
            type_name.clone(),
            type_name,
            settings,
        ));
        self
    }

    /// Instantiate every plugin and assemble the pipeline
    ///
    /// Fails fast on unknown plugin types and invalid settings.
    pub fn build(self) -> Result<Pipeline, PluginError> {
        let low = self
            .low_watermark
            .unwrap_or_else(|| self.high_watermark.saturating_sub(1));
        let mut coordinator =
            Coordinator::new(self.high_watermark, low, Chain::new(self.filters));

        for descriptor in &self.outputs {
            coordinator.add_output(self.registry.create_output(descriptor)?);
        }
        for descriptor in &self.inputs {
            coordinator.add_input(self.registry.create_input(descriptor)?);
        }

        Ok(Pipeline {
            coordinator,
            telemetry: self.telemetry,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully assembled pipeline, ready to run
pub struct Pipeline {
    coordinator: Coordinator,
    telemetry: ReporterConfig,
}

impl Pipeline {
    /// Handle to the pipeline metrics
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.coordinator.metrics()
    }

    /// Run until every input has exited
    ///
    /// Cancelling `shutdown` stops the inputs and drains everything that
    /// is already in flight; the telemetry reporter sends a final round
    /// and stops with the pipeline.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), PipelineError> {
        let stats: Arc<dyn StatsSource> = Arc::new(PipelineStats {
            metrics: self.coordinator.metrics(),
            governor: self.coordinator.governor(),
        });

        let reporter_token = CancellationToken::new();
        let reporter =
            stashline_telemetry::spawn(self.telemetry, vec![stats], reporter_token.clone());

        let result = self.coordinator.run(shutdown).await;

        reporter_token.cancel();
        let _ = reporter.await;
        result
    }
}

/// Bridges pipeline metrics into the telemetry reporter
struct PipelineStats {
    metrics: Arc<PipelineMetrics>,
    governor: Arc<Governor>,
}

impl StatsSource for PipelineStats {
    fn counters(&self) -> Vec<(&'static str, u64)> {
        let s = self.metrics.snapshot();
        vec![
            ("events.received", s.events_received),
            ("events.completed", s.events_completed),
            ("events.cancelled", s.events_cancelled),
            ("events.errored", s.events_errored),
            ("batches.flushed", s.batches_flushed),
            ("events.flushed", s.events_flushed),
            ("flush.failures", s.flush_failures),
            ("flush.retries", s.flush_retries),
            ("flush.duration_ns", s.flush_duration_ns),
            ("batches.poisoned", s.batches_poisoned),
            ("governor.pauses", s.pause_events),
            ("governor.resumes", s.resume_events),
        ]
    }

    fn gauges(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("events.in_flight", self.governor.in_flight()),
            ("governor.paused", self.governor.is_paused() as u64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_has_builtins() {
        let registry = default_registry();
        assert!(registry.has_input_type("tcp"));
        assert!(registry.has_output_type("stdout"));
        assert!(registry.has_output_type("null"));
    }

    #[test]
    fn test_build_from_config() {
        let config = Config::from_toml(
            r#"
            [pipeline]
            high_watermark = 500

            [[inputs]]
            type = "tcp"
            [inputs.settings]
            port = 5514

            [[outputs]]
            type = "null"
            "#,
        )
        .unwrap();

        let pipeline = PipelineBuilder::from_config(config).build();
        assert!(pipeline.is_ok());
    }

    #[test]
    fn test_unknown_output_type_fails_build() {
        let config = Config::from_toml(
            r#"
            [[inputs]]
            type = "tcp"
            [inputs.settings]
            port = 5514

            [[outputs]]
            type = "elasticsearch"
            "#,
        )
        .unwrap();

        let err = PipelineBuilder::from_config(config)
            .build()
            .map(|_| ())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown output type 'elasticsearch'"));
        assert!(msg.contains("stdout"));
    }

    #[test]
    fn test_bad_settings_fail_build() {
        let err = PipelineBuilder::new()
            .add_input("tcp", HashMap::new())
            .add_output("null", HashMap::new())
            .build()
            .map(|_| ())
            .unwrap_err();
        assert!(err.to_string().contains("missing required setting 'port'"));
    }

    #[test]
    fn test_pipeline_stats_export_flush_timing() {
        let coordinator = Coordinator::new(10, 9, Chain::new(Vec::new()));
        let metrics = coordinator.metrics();
        metrics.record_batch_flushed(5, Duration::from_millis(2));

        let stats = PipelineStats {
            metrics: coordinator.metrics(),
            governor: coordinator.governor(),
        };
        let counters = stats.counters();
        assert!(counters.contains(&("batches.flushed", 1)));
        assert!(counters.contains(&("events.flushed", 5)));
        assert!(counters.contains(&("flush.duration_ns", 2_000_000)));
    }

    #[test]
    fn test_build_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stashline.toml");
        std::fs::write(
            &path,
            r#"
            [pipeline]
            high_watermark = 1000

            [[inputs]]
            type = "tcp"
            [inputs.settings]
            port = 5514

            [[outputs]]
            type = "null"
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(PipelineBuilder::from_config(config).build().is_ok());
    }

    #[test]
    fn test_tcp_input_requires_concrete_port() {
        let config = Config::from_toml(
            r#"
            [[inputs]]
            type = "tcp"
            [inputs.settings]
            host = "127.0.0.1"
            port = 0

            [[outputs]]
            type = "null"
            "#,
        )
        .unwrap();

        // port 0 is rejected by the tcp factory, which is the contract:
        // listeners need a concrete port
        assert!(PipelineBuilder::from_config(config).build().is_err());
    }
}
