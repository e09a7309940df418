//! Event - the unit of data flowing through the pipeline
//!
//! Filters mutate the `data` map in place; the `source` metadata is frozen
//! at receipt and only readable afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Lifecycle state of an event
///
/// An event is created `Pending`, enters `InFilterChain` when the chain
/// starts executing, and ends in exactly one terminal state. Terminal
/// states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventState {
    /// Created by an input, not yet filtered
    Pending,

    /// Currently moving through the filter chain
    InFilterChain,

    /// Survived the full chain; eligible for batching
    Completed,

    /// A filter cancelled the event; it will never reach an output
    Cancelled,

    /// A filter or output write failed; it will never reach an output
    Errored,
}

impl EventState {
    /// Whether this state is terminal
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Errored)
    }
}

/// Immutable receipt metadata set by the originating input
///
/// Filters can read this (e.g. to fall back to the receipt timestamp when
/// the payload has none) but never modify it.
#[derive(Debug, Clone, Serialize)]
pub struct EventSource {
    /// Instance name of the input that produced the event
    pub input: String,

    /// When the input received the raw data
    pub received_at: DateTime<Utc>,

    /// Origin identifier, e.g. the remote peer address
    pub origin: Option<String>,
}

impl EventSource {
    /// Create source metadata stamped with the current time
    pub fn now(input: impl Into<String>, origin: Option<String>) -> Self {
        Self {
            input: input.into(),
            received_at: Utc::now(),
            origin,
        }
    }
}

/// The unit of data flowing through the pipeline
///
/// `data` is the mutable payload filters read and write. Events are owned
/// exclusively by whichever component currently holds them; the chain is
/// sequential per event, so no locking is needed around `data`.
#[derive(Debug, Clone)]
pub struct Event {
    data: Map<String, Value>,
    source: EventSource,
    state: EventState,
}

impl Event {
    /// Create an empty pending event
    pub fn new(source: EventSource) -> Self {
        Self {
            data: Map::new(),
            source,
            state: EventState::Pending,
        }
    }

    /// Create an event from a raw text line
    ///
    /// The line lands in `data["message"]`, matching what line-oriented
    /// inputs produce before any parsing filters run.
    pub fn from_line(source: EventSource, line: impl Into<String>) -> Self {
        let mut event = Self::new(source);
        event
            .data
            .insert("message".to_string(), Value::String(line.into()));
        event
    }

    /// Read-only view of the payload
    #[inline]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Mutable view of the payload (for filters)
    #[inline]
    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    /// Receipt metadata (read-only)
    #[inline]
    pub fn source(&self) -> &EventSource {
        &self.source
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> EventState {
        self.state
    }

    /// Mark the event as entering the filter chain
    ///
    /// No-op once the event is terminal.
    pub fn mark_filtering(&mut self) {
        if !self.state.is_terminal() {
            self.state = EventState::InFilterChain;
        }
    }

    /// Mark the event completed
    pub fn mark_completed(&mut self) {
        if !self.state.is_terminal() {
            self.state = EventState::Completed;
        }
    }

    /// Mark the event cancelled
    pub fn mark_cancelled(&mut self) {
        if !self.state.is_terminal() {
            self.state = EventState::Cancelled;
        }
    }

    /// Mark the event errored
    ///
    /// Unlike the other transitions this also demotes `Completed`: a
    /// completed event whose batch exhausts its write retries is errored.
    pub fn mark_errored(&mut self) {
        if !matches!(self.state, EventState::Cancelled) {
            self.state = EventState::Errored;
        }
    }

    /// Compact JSON snapshot of the payload for diagnostics
    ///
    /// Used when logging filter failures so a bad event can be diagnosed
    /// without restarting the pipeline.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.data).unwrap_or_else(|_| "<unserializable>".to_string())
    }
}
