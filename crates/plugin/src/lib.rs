//! Stashline - Plugin contracts
//!
//! The pipeline core knows nothing about wire protocols. Inputs and outputs
//! are pluggable implementations of two narrow capability contracts defined
//! here, created by name from a factory [`Registry`] populated at startup
//! and never modified at runtime.
//!
//! # Capability contracts
//!
//! - [`InputPlugin`] produces events into the pipeline and must honor a
//!   cooperative pause signal: stop producing new events while paused,
//!   without dropping already-received data where the transport allows
//!   buffering.
//! - [`OutputPlugin`] receives ordered batches of completed events via
//!   `write_batch` and advertises its desired batch size, flush interval,
//!   and retry limit.
//!
//! # Design
//!
//! - Traits are object-safe; the coordinator works with `Box<dyn ...>`
//! - `InputContext` bundles everything a running input needs: the event
//!   sender (which admits events into backpressure accounting), the pause
//!   watch, and the shutdown token
//! - Settings are opaque key/value maps interpreted by factories, which
//!   fail fast on malformed or unknown keys

mod descriptor;
mod error;
mod registry;
mod settings;

pub use descriptor::{PluginDescriptor, PluginKind};
pub use error::{PluginError, Result};
pub use registry::{InputFactory, OutputFactory, Registry};
pub use settings::PluginSettings;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stashline_event::Event;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Default output batch size when a plugin does not specify one
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default flush interval for partial batches
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Default write retry limit before a batch is dropped
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Hook invoked when an input produces an event
///
/// The pipeline's backpressure governor implements this so that admission
/// happens at production time, before the event is queued anywhere.
pub trait Admission: Send + Sync {
    /// Count one produced event
    fn admit(&self);
}

/// Sender side of the event channel handed to inputs
///
/// Wraps the pipeline channel and the admission hook so that every event an
/// input produces is admitted into backpressure accounting exactly once,
/// at the moment it is produced.
#[derive(Clone)]
pub struct EventSender {
    inner: mpsc::Sender<Event>,
    admission: Arc<dyn Admission>,
}

impl EventSender {
    /// Create a sender over a pipeline channel
    pub fn new(inner: mpsc::Sender<Event>, admission: Arc<dyn Admission>) -> Self {
        Self { inner, admission }
    }

    /// Send one event into the pipeline
    ///
    /// Admits the event, then waits for channel capacity. Returns
    /// `PluginError::ChannelClosed` when the pipeline is shutting down.
    pub async fn send(&self, event: Event) -> Result<()> {
        self.admission.admit();
        self.inner
            .send(event)
            .await
            .map_err(|_| PluginError::ChannelClosed)
    }

    /// Whether the pipeline side is gone
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Everything a running input needs from the pipeline
pub struct InputContext {
    /// Channel for produced events
    pub events: EventSender,

    /// Pause signal: `true` while inputs should stop producing
    pub pause: watch::Receiver<bool>,

    /// Cancelled when the pipeline shuts down
    pub shutdown: CancellationToken,
}

impl InputContext {
    /// Whether inputs are currently asked to pause
    pub fn is_paused(&self) -> bool {
        *self.pause.borrow()
    }

    /// Wait until the pause signal clears
    ///
    /// Returns immediately when not paused. Inputs call this at their
    /// natural production points (e.g. before each socket read) so pausing
    /// stops new work without dropping buffered data.
    pub async fn wait_resumed(&mut self) {
        while *self.pause.borrow_and_update() {
            if self.pause.changed().await.is_err() {
                // Pause sender gone - pipeline is tearing down
                return;
            }
        }
    }
}

/// Capability contract for input plugins
///
/// `run` consumes the plugin and drives it until shutdown. Implementations
/// must exit when `ctx.shutdown` is cancelled and must honor the pause
/// signal via `ctx.wait_resumed()`.
#[async_trait]
pub trait InputPlugin: Send {
    /// Instance name for logging and event source metadata
    fn name(&self) -> &str;

    /// Run the input until shutdown
    async fn run(self: Box<Self>, ctx: InputContext) -> Result<()>;
}

/// Capability contract for output plugins
///
/// `write_batch` is batch-atomic from the pipeline's point of view: it
/// either succeeds for the whole batch or fails for the whole batch, and
/// the scheduler retries the whole batch on failure.
#[async_trait]
pub trait OutputPlugin: Send {
    /// Instance name for logging and routing
    fn name(&self) -> &str;

    /// Desired number of events per batch
    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// Maximum age of a non-empty batch before it is flushed anyway
    fn flush_interval(&self) -> Duration {
        DEFAULT_FLUSH_INTERVAL
    }

    /// Write attempts per batch before it is dropped as poison
    fn max_retries(&self) -> u32 {
        DEFAULT_MAX_RETRIES
    }

    /// Write one batch, in enqueue order
    async fn write_batch(&mut self, items: &[Event]) -> Result<()>;
}
