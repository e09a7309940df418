//! Statsd client - plain-text metrics over UDP
//!
//! Speaks the statsd line protocol (`name:value|c` for counts,
//! `name:value|g` for gauges), which statsite and compatible aggregators
//! accept. Multiple lines are packed into one datagram up to a safe MTU.

use tokio::net::{lookup_host, UdpSocket};

use crate::error::TelemetryError;

/// Keep datagrams under the conventional safe statsd payload size
const MAX_DATAGRAM: usize = 1400;

/// UDP statsd client
pub struct StatsdClient {
    socket: UdpSocket,
    prefix: String,
}

impl StatsdClient {
    /// Resolve the aggregator address and bind a local socket
    pub async fn connect(host: &str, port: u16, prefix: &str) -> Result<Self, TelemetryError> {
        let target = format!("{}:{}", host, port);
        let addr = lookup_host(target.as_str())
            .await
            .map_err(|_| TelemetryError::Resolve(target.clone()))?
            .next()
            .ok_or_else(|| TelemetryError::Resolve(target.clone()))?;

        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(addr).await?;

        Ok(Self {
            socket,
            prefix: prefix.to_string(),
        })
    }

    /// Format a counter line
    pub fn format_count(&self, name: &str, value: u64) -> String {
        format!("{}.{}:{}|c", self.prefix, name, value)
    }

    /// Format a gauge line
    pub fn format_gauge(&self, name: &str, value: u64) -> String {
        format!("{}.{}:{}|g", self.prefix, name, value)
    }

    /// Send a counter
    pub async fn count(&self, name: &str, value: u64) -> Result<(), TelemetryError> {
        let line = self.format_count(name, value);
        self.socket.send(line.as_bytes()).await?;
        Ok(())
    }

    /// Send a gauge
    pub async fn gauge(&self, name: &str, value: u64) -> Result<(), TelemetryError> {
        let line = self.format_gauge(name, value);
        self.socket.send(line.as_bytes()).await?;
        Ok(())
    }

    /// Send many lines, packed into as few datagrams as possible
    pub async fn send_lines(&self, lines: &[String]) -> Result<(), TelemetryError> {
        let mut datagram = String::with_capacity(MAX_DATAGRAM);
        for line in lines {
            if !datagram.is_empty() && datagram.len() + 1 + line.len() > MAX_DATAGRAM {
                self.socket.send(datagram.as_bytes()).await?;
                datagram.clear();
            }
            if !datagram.is_empty() {
                datagram.push('\n');
            }
            datagram.push_str(line);
        }
        if !datagram.is_empty() {
            self.socket.send(datagram.as_bytes()).await?;
        }
        Ok(())
    }
}
