//! Built-in filters
//!
//! Filters are registered programmatically by whoever embeds the engine;
//! the ones here cover common log-shaping needs so simple deployments do
//! not have to write their own.

use regex::Regex;
use serde_json::Value;
use stashline_event::Event;
use stashline_filter::{BoxFuture, Filter, FilterResult, Verdict};

/// Splits a trailing `[pid]` off `syslog.service`
///
/// Syslog tags usually look like `sshd[4901]`. This rewrites
/// `data.syslog.service` to the bare service name and records the pid in
/// `data.syslog.service_pid`, so downstream grouping by service works.
/// Events without a `syslog` object pass through untouched.
pub struct StripServicePid {
    pattern: Regex,
}

impl StripServicePid {
    pub fn new() -> Self {
        Self {
            // Service names never contain brackets, so this cannot backtrack
            pattern: Regex::new(r"^(.*)\[([0-9]+)\]$").expect("pattern is valid"),
        }
    }
}

impl Default for StripServicePid {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for StripServicePid {
    fn name(&self) -> &'static str {
        "strip_service_pid"
    }

    fn apply<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, FilterResult<Verdict>> {
        let rewrite = event
            .data()
            .get("syslog")
            .and_then(|s| s.get("service"))
            .and_then(|v| v.as_str())
            .and_then(|service| {
                self.pattern.captures(service).map(|captures| {
                    (captures[1].to_string(), captures[2].to_string())
                })
            });

        if let Some((service, pid)) = rewrite {
            if let Some(Value::Object(syslog)) = event.data_mut().get_mut("syslog") {
                syslog.insert("service".to_string(), Value::String(service));
                syslog.insert("service_pid".to_string(), Value::String(pid));
            }
        }

        Box::pin(async { Ok(Verdict::Next) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stashline_event::EventSource;
    use stashline_filter::{Chain, ChainOutcome};

    fn syslog_event(service: &str) -> Event {
        let mut event = Event::new(EventSource::now("relp", None));
        event
            .data_mut()
            .insert("syslog".to_string(), json!({ "service": service }));
        event
    }

    #[tokio::test]
    async fn test_pid_stripped_into_own_field() {
        let chain = Chain::new(vec![Box::new(StripServicePid::new())]);
        let mut event = syslog_event("sshd[4901]");

        assert!(matches!(chain.run(&mut event).await, ChainOutcome::Completed));

        let syslog = event.data().get("syslog").unwrap();
        assert_eq!(syslog.get("service").and_then(|v| v.as_str()), Some("sshd"));
        assert_eq!(
            syslog.get("service_pid").and_then(|v| v.as_str()),
            Some("4901")
        );
    }

    #[tokio::test]
    async fn test_service_without_pid_untouched() {
        let chain = Chain::new(vec![Box::new(StripServicePid::new())]);
        let mut event = syslog_event("cron");

        chain.run(&mut event).await;

        let syslog = event.data().get("syslog").unwrap();
        assert_eq!(syslog.get("service").and_then(|v| v.as_str()), Some("cron"));
        assert!(syslog.get("service_pid").is_none());
    }

    #[tokio::test]
    async fn test_event_without_syslog_passes_through() {
        let chain = Chain::new(vec![Box::new(StripServicePid::new())]);
        let mut event = Event::from_line(EventSource::now("tcp", None), "raw line");

        assert!(matches!(chain.run(&mut event).await, ChainOutcome::Completed));
        assert_eq!(
            event.data().get("message").and_then(|v| v.as_str()),
            Some("raw line")
        );
    }
}
