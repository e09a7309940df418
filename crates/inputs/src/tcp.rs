//! TCP input - line-delimited text listener
//!
//! Accepts TCP connections and turns each received line into one event,
//! with the raw text in `data["message"]` and the peer address recorded as
//! the event origin.
//!
//! # Design
//!
//! - **Per-connection tasks**: each accepted connection gets its own
//!   handler task; a slow peer never stalls the others
//! - **Buffered framing**: reads go through `bytes::BytesMut`; partial
//!   lines stay buffered until their newline arrives
//! - **Pause-aware**: the handler waits on the pipeline pause signal before
//!   each socket read, so backpressure stops new reads while the kernel
//!   buffers whatever peers keep sending

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use stashline_event::{Event, EventSource};
use stashline_plugin::{
    InputContext, InputFactory, InputPlugin, PluginDescriptor, PluginError, Result,
};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};

use crate::common::InputMetrics;

/// Default read buffer size per connection (64KB)
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// TCP input configuration
#[derive(Debug, Clone)]
pub struct TcpInputConfig {
    /// Instance name, used as the event source input name
    pub name: String,

    /// Bind address (e.g. "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Read buffer size per connection
    pub buffer_size: usize,
}

impl TcpInputConfig {
    /// The socket address to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Line-delimited TCP input
pub struct TcpInput {
    config: TcpInputConfig,
    metrics: Arc<InputMetrics>,
}

impl TcpInput {
    /// Create a new TCP input
    pub fn new(config: TcpInputConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(InputMetrics::new()),
        }
    }

    /// Handle to the input's metrics, valid after `run()` consumes the input
    pub fn metrics_handle(&self) -> Arc<InputMetrics> {
        Arc::clone(&self.metrics)
    }

    async fn accept_loop(self, listener: TcpListener, ctx: InputContext) -> Result<()> {
        loop {
            tokio::select! {
                _ = ctx.shutdown.cancelled() => break,
                result = listener.accept() => match result {
                    Ok((stream, peer)) => {
                        self.metrics.connection_opened();

                        let conn = Connection {
                            input: self.config.name.clone(),
                            buffer_size: self.config.buffer_size,
                            metrics: Arc::clone(&self.metrics),
                        };
                        let conn_ctx = InputContext {
                            events: ctx.events.clone(),
                            pause: ctx.pause.clone(),
                            shutdown: ctx.shutdown.child_token(),
                        };

                        tokio::spawn(async move {
                            if let Err(e) = conn.handle(stream, peer, conn_ctx).await {
                                match e {
                                    // Normal teardown, nothing to report
                                    PluginError::ChannelClosed => {}
                                    e => {
                                        conn.metrics.error();
                                        tracing::debug!(peer = %peer, error = %e, "connection error");
                                    }
                                }
                            }
                            conn.metrics.connection_closed();
                        });
                    }
                    Err(e) => {
                        // Transient accept errors - log and keep listening
                        tracing::warn!(input = %self.config.name, error = %e, "accept error");
                        self.metrics.error();
                    }
                }
            }
        }

        tracing::info!(input = %self.config.name, "tcp input stopped");
        Ok(())
    }
}

#[async_trait::async_trait]
impl InputPlugin for TcpInput {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn run(self: Box<Self>, ctx: InputContext) -> Result<()> {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| PluginError::Bind {
                address: bind_addr.clone(),
                source: e,
            })?;

        tracing::info!(
            input = %self.config.name,
            address = %bind_addr,
            "tcp input listening"
        );

        self.accept_loop(listener, ctx).await
    }
}

/// State for one accepted connection
struct Connection {
    input: String,
    buffer_size: usize,
    metrics: Arc<InputMetrics>,
}

impl Connection {
    /// Read the connection to EOF, emitting one event per line
    async fn handle(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
        mut ctx: InputContext,
    ) -> Result<()> {
        let origin = peer.to_string();
        let mut buf = BytesMut::with_capacity(self.buffer_size);

        loop {
            // Stop pulling bytes while paused; the kernel buffers whatever
            // the peer keeps sending, so nothing already sent is dropped.
            ctx.wait_resumed().await;

            let n = tokio::select! {
                _ = ctx.shutdown.cancelled() => return Ok(()),
                result = stream.read_buf(&mut buf) => result?,
            };

            if n == 0 {
                // EOF: a trailing unterminated line still counts
                if let Some(line) = trim_line(&buf) {
                    self.emit(line, &origin, &ctx).await?;
                }
                return Ok(());
            }

            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let raw = buf.split_to(pos + 1);
                if let Some(line) = trim_line(&raw[..pos]) {
                    self.emit(line, &origin, &ctx).await?;
                }
            }
        }
    }

    async fn emit(&self, line: String, origin: &str, ctx: &InputContext) -> Result<()> {
        let bytes = line.len() as u64;
        let event = Event::from_line(
            EventSource::now(self.input.as_str(), Some(origin.to_string())),
            line,
        );
        ctx.events.send(event).await?;
        self.metrics.event_produced(bytes);
        Ok(())
    }
}

/// Strip a trailing CR and decode; empty lines are skipped
fn trim_line(raw: &[u8]) -> Option<String> {
    let raw = match raw {
        [head @ .., b'\r'] => head,
        other => other,
    };
    if raw.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(raw).into_owned())
    }
}

/// Factory for the `tcp` input type
pub struct TcpInputFactory;

impl InputFactory for TcpInputFactory {
    fn type_name(&self) -> &'static str {
        "tcp"
    }

    fn create(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn InputPlugin>> {
        let mut settings = descriptor.settings();
        let address = settings
            .get_str("host")?
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let port = settings
            .get_port("port")?
            .ok_or_else(|| PluginError::config("missing required setting 'port'"))?;
        let buffer_size = settings
            .get_usize("buffer_size")?
            .unwrap_or(DEFAULT_BUFFER_SIZE);
        settings.finish()?;

        Ok(Box::new(TcpInput::new(TcpInputConfig {
            name: descriptor.name.clone(),
            address,
            port,
            buffer_size,
        })))
    }
}
