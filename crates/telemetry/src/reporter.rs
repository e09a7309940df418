//! Telemetry reporter - periodic statsd emission
//!
//! The reporter runs in a dedicated task and never blocks the pipeline.
//! Every interval it snapshots its stat sources, turns cumulative counters
//! into per-interval deltas, and ships everything to the aggregator in as
//! few datagrams as possible. All failures are logged and swallowed;
//! telemetry being down never affects event flow.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::statsd::StatsdClient;

/// Something that exposes metrics for periodic reporting
///
/// Counters are cumulative since process start; the reporter diffs
/// successive snapshots. Gauges are instantaneous values sent as-is.
pub trait StatsSource: Send + Sync {
    /// Cumulative counters, by metric name
    fn counters(&self) -> Vec<(&'static str, u64)>;

    /// Instantaneous gauges, by metric name
    fn gauges(&self) -> Vec<(&'static str, u64)>;
}

/// Configuration for the telemetry reporter
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Whether telemetry is enabled at all
    pub enabled: bool,

    /// Statsd aggregator host
    pub host: String,

    /// Statsd aggregator port
    pub port: u16,

    /// How often to report
    pub interval: Duration,

    /// Metric name prefix
    pub prefix: String,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 8125,
            interval: Duration::from_secs(10),
            prefix: "stashline".to_string(),
        }
    }
}

/// Telemetry reporter that runs in a background task
pub struct Reporter {
    config: ReporterConfig,
    sources: Vec<Arc<dyn StatsSource>>,
    last_counters: Vec<HashMap<&'static str, u64>>,
    client: Option<StatsdClient>,
    connect_failed: bool,
}

impl Reporter {
    /// Create a reporter over the given stat sources
    pub fn new(config: ReporterConfig, sources: Vec<Arc<dyn StatsSource>>) -> Self {
        let last_counters = sources.iter().map(|_| HashMap::new()).collect();
        Self {
            config,
            sources,
            last_counters,
            client: None,
            connect_failed: false,
        }
    }

    /// Run the reporter loop until shutdown
    ///
    /// Exits immediately when telemetry is disabled. A final report is
    /// attempted on shutdown so short-lived counters are not lost.
    pub async fn run(mut self, shutdown: CancellationToken) {
        if !self.config.enabled {
            debug!("telemetry disabled, reporter exiting");
            return;
        }

        debug!(
            host = %self.config.host,
            port = self.config.port,
            interval_secs = self.config.interval.as_secs(),
            prefix = %self.config.prefix,
            "telemetry reporter started"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The immediate first tick would report an empty interval
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.report().await;
                    debug!("telemetry reporter shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.report().await;
                }
            }
        }
    }

    /// Snapshot every source and ship one round of metrics
    async fn report(&mut self) {
        if self.client.is_none() {
            match StatsdClient::connect(&self.config.host, self.config.port, &self.config.prefix)
                .await
            {
                Ok(client) => {
                    self.client = Some(client);
                    self.connect_failed = false;
                }
                Err(e) => {
                    // Warn once per outage, retry every interval
                    if !self.connect_failed {
                        warn!(error = %e, "cannot reach statsd, will keep retrying");
                        self.connect_failed = true;
                    }
                    return;
                }
            }
        }
        let client = self.client.as_ref().expect("client connected above");

        let mut lines = Vec::new();
        for (i, source) in self.sources.iter().enumerate() {
            for (name, value) in source.counters() {
                let prev = self.last_counters[i].insert(name, value).unwrap_or(0);
                let delta = value.saturating_sub(prev);
                if delta > 0 {
                    lines.push(client.format_count(name, delta));
                }
            }
            for (name, value) in source.gauges() {
                lines.push(client.format_gauge(name, value));
            }
        }

        if let Err(e) = client.send_lines(&lines).await {
            debug!(error = %e, "failed to send telemetry");
            // Force a reconnect next interval
            self.client = None;
        }
    }
}

/// Spawn the reporter as a background task
pub fn spawn(
    config: ReporterConfig,
    sources: Vec<Arc<dyn StatsSource>>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(Reporter::new(config, sources).run(shutdown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::net::UdpSocket;

    struct FakeSource {
        received: AtomicU64,
        in_flight: AtomicU64,
    }

    impl StatsSource for FakeSource {
        fn counters(&self) -> Vec<(&'static str, u64)> {
            vec![("events.received", self.received.load(Ordering::Relaxed))]
        }

        fn gauges(&self) -> Vec<(&'static str, u64)> {
            vec![("in_flight", self.in_flight.load(Ordering::Relaxed))]
        }
    }

    #[tokio::test]
    async fn test_disabled_reporter_exits() {
        let reporter = Reporter::new(ReporterConfig::default(), Vec::new());
        tokio::time::timeout(
            Duration::from_millis(100),
            reporter.run(CancellationToken::new()),
        )
        .await
        .expect("disabled reporter should exit immediately");
    }

    #[tokio::test]
    async fn test_counters_reported_as_deltas() {
        let sink = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = sink.local_addr().unwrap().port();

        let source = Arc::new(FakeSource {
            received: AtomicU64::new(5),
            in_flight: AtomicU64::new(3),
        });
        let config = ReporterConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port,
            interval: Duration::from_millis(20),
            prefix: "stashline".to_string(),
        };

        let shutdown = CancellationToken::new();
        let task = spawn(config, vec![source.clone()], shutdown.clone());

        let mut buf = [0u8; 1500];
        let n = sink.recv(&mut buf).await.unwrap();
        let first = String::from_utf8_lossy(&buf[..n]).to_string();
        assert!(first.contains("stashline.events.received:5|c"), "got: {first}");
        assert!(first.contains("stashline.in_flight:3|g"), "got: {first}");

        // Counter grows by 3; only the delta is reported
        source.received.store(8, Ordering::Relaxed);
        let next = loop {
            let n = sink.recv(&mut buf).await.unwrap();
            let datagram = String::from_utf8_lossy(&buf[..n]).to_string();
            if datagram.contains("events.received") {
                break datagram;
            }
        };
        assert!(next.contains("stashline.events.received:3|c"), "got: {next}");

        shutdown.cancel();
        task.await.unwrap();
    }
}
