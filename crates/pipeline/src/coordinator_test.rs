//! Coordinator tests - the pipeline end to end with scripted plugins

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use stashline_event::{Event, EventSource};
use stashline_filter::{Chain, FilterFn, Verdict};
use stashline_plugin::{InputContext, InputPlugin, OutputPlugin, PluginError};
use tokio_util::sync::CancellationToken;

use super::Coordinator;

/// Input that produces fixed lines, honoring the pause signal, then exits
struct ScriptInput {
    name: String,
    lines: Vec<String>,
}

impl ScriptInput {
    fn new(name: &str, lines: &[&str]) -> Box<Self> {
        Box::new(Self {
            name: name.to_string(),
            lines: lines.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl InputPlugin for ScriptInput {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(self: Box<Self>, mut ctx: InputContext) -> stashline_plugin::Result<()> {
        for line in &self.lines {
            ctx.wait_resumed().await;
            ctx.events
                .send(Event::from_line(
                    EventSource::now(self.name.as_str(), None),
                    line.clone(),
                ))
                .await?;
        }
        Ok(())
    }
}

/// Input that fails on startup
struct BrokenInput;

#[async_trait]
impl InputPlugin for BrokenInput {
    fn name(&self) -> &str {
        "broken"
    }

    async fn run(self: Box<Self>, _ctx: InputContext) -> stashline_plugin::Result<()> {
        Err(PluginError::Bind {
            address: "0.0.0.0:1".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }
}

/// Input that produces nothing and waits for shutdown
struct IdleInput;

#[async_trait]
impl InputPlugin for IdleInput {
    fn name(&self) -> &str {
        "idle"
    }

    async fn run(self: Box<Self>, ctx: InputContext) -> stashline_plugin::Result<()> {
        ctx.shutdown.cancelled().await;
        Ok(())
    }
}

/// Output that records every message it is handed
struct CollectingOutput {
    name: String,
    batch_size: usize,
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingOutput {
    fn new(name: &str, batch_size: usize) -> (Box<Self>, Arc<Mutex<Vec<String>>>) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        (
            Box::new(Self {
                name: name.to_string(),
                batch_size,
                messages: messages.clone(),
            }),
            messages,
        )
    }
}

#[async_trait]
impl OutputPlugin for CollectingOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn flush_interval(&self) -> Duration {
        Duration::from_millis(20)
    }

    async fn write_batch(&mut self, items: &[Event]) -> stashline_plugin::Result<()> {
        let mut messages = self.messages.lock().unwrap();
        for event in items {
            messages.push(
                event
                    .data()
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            );
        }
        Ok(())
    }
}

fn coordinator(chain: Chain) -> Coordinator {
    Coordinator::new(1000, 999, chain)
}

#[tokio::test]
async fn test_end_to_end_delivery_in_order() {
    let mut c = coordinator(Chain::empty());
    let governor = c.governor();
    let metrics = c.metrics();

    let (output, messages) = CollectingOutput::new("sink", 2);
    c.add_output(output);
    c.add_input(ScriptInput::new("scripted", &["a", "b", "c"]));

    c.run(CancellationToken::new()).await.unwrap();

    assert_eq!(*messages.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(governor.in_flight(), 0);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.events_received, 3);
    assert_eq!(snapshot.events_completed, 3);
    assert_eq!(snapshot.events_flushed, 3);
}

#[tokio::test]
async fn test_cancelled_events_never_reach_outputs() {
    let chain = Chain::new(vec![Box::new(FilterFn::new("drop_noise", |event: &mut Event| {
        let noisy = event
            .data()
            .get("message")
            .and_then(|v| v.as_str())
            .is_some_and(|m| m.contains("noise"));
        if noisy {
            return Ok(Verdict::Cancel);
        }
        Ok(Verdict::Next)
    }))]);

    let mut c = coordinator(chain);
    let governor = c.governor();
    let metrics = c.metrics();

    let (output, messages) = CollectingOutput::new("sink", 1);
    c.add_output(output);
    c.add_input(ScriptInput::new("scripted", &["keep", "noise!", "keep2"]));

    c.run(CancellationToken::new()).await.unwrap();

    assert_eq!(*messages.lock().unwrap(), vec!["keep", "keep2"]);
    assert_eq!(metrics.snapshot().events_cancelled, 1);
    assert_eq!(governor.in_flight(), 0);
}

#[tokio::test]
async fn test_filter_mutations_visible_at_output() {
    let chain = Chain::new(vec![Box::new(FilterFn::new("upcase", |event: &mut Event| {
        if let Some(Value::String(msg)) = event.data_mut().get_mut("message") {
            *msg = msg.to_uppercase();
        }
        Ok(Verdict::Next)
    }))]);

    let mut c = coordinator(chain);
    let (output, messages) = CollectingOutput::new("sink", 10);
    c.add_output(output);
    c.add_input(ScriptInput::new("scripted", &["hello"]));

    c.run(CancellationToken::new()).await.unwrap();

    assert_eq!(*messages.lock().unwrap(), vec!["HELLO"]);
}

#[tokio::test]
async fn test_fanout_delivers_to_every_output() {
    let mut c = coordinator(Chain::empty());
    let governor = c.governor();

    let (first, first_messages) = CollectingOutput::new("first", 2);
    let (second, second_messages) = CollectingOutput::new("second", 3);
    c.add_output(first);
    c.add_output(second);
    c.add_input(ScriptInput::new("scripted", &["x", "y", "z"]));

    c.run(CancellationToken::new()).await.unwrap();

    assert_eq!(*first_messages.lock().unwrap(), vec!["x", "y", "z"]);
    assert_eq!(*second_messages.lock().unwrap(), vec!["x", "y", "z"]);
    assert_eq!(governor.in_flight(), 0);
}

#[tokio::test]
async fn test_no_outputs_still_releases_events() {
    let mut c = coordinator(Chain::empty());
    let governor = c.governor();
    let metrics = c.metrics();

    c.add_input(ScriptInput::new("scripted", &["a", "b"]));

    c.run(CancellationToken::new()).await.unwrap();

    assert_eq!(metrics.snapshot().events_completed, 2);
    assert_eq!(governor.in_flight(), 0);
}

#[tokio::test]
async fn test_per_input_order_with_multiple_inputs() {
    let mut c = coordinator(Chain::empty());

    let (output, messages) = CollectingOutput::new("sink", 1);
    c.add_output(output);
    c.add_input(ScriptInput::new("one", &["1a", "1b", "1c"]));
    c.add_input(ScriptInput::new("two", &["2a", "2b", "2c"]));

    c.run(CancellationToken::new()).await.unwrap();

    // Interleaving across inputs is free, order within an input is not
    let all = messages.lock().unwrap().clone();
    let ones: Vec<&String> = all.iter().filter(|m| m.starts_with('1')).collect();
    let twos: Vec<&String> = all.iter().filter(|m| m.starts_with('2')).collect();
    assert_eq!(ones, vec!["1a", "1b", "1c"]);
    assert_eq!(twos, vec!["2a", "2b", "2c"]);
}

#[tokio::test]
async fn test_watermark_cycle_pauses_and_resumes() {
    // high = 1: the very first admit pauses, every drain resumes
    let mut c = Coordinator::new(1, 0, Chain::empty());
    let governor = c.governor();
    let metrics = c.metrics();

    let (output, messages) = CollectingOutput::new("sink", 1);
    c.add_output(output);
    c.add_input(ScriptInput::new("scripted", &["a", "b", "c"]));

    c.run(CancellationToken::new()).await.unwrap();

    assert_eq!(*messages.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(governor.in_flight(), 0);
    assert!(!governor.is_paused());

    let snapshot = metrics.snapshot();
    assert!(snapshot.pause_events >= 1);
    assert_eq!(snapshot.pause_events, snapshot.resume_events);
}

#[tokio::test]
async fn test_failed_input_stops_the_pipeline() {
    let mut c = coordinator(Chain::empty());

    let (output, _messages) = CollectingOutput::new("sink", 1);
    c.add_output(output);
    c.add_input(Box::new(BrokenInput));
    c.add_input(Box::new(IdleInput));

    // The idle input only exits via the shutdown cascade the broken
    // input triggers; a hang here means the cascade is broken
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        c.run(CancellationToken::new()),
    )
    .await
    .expect("pipeline did not shut down after input failure");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("failed to bind"));
}

#[tokio::test]
async fn test_external_shutdown_drains_open_batches() {
    let mut c = coordinator(Chain::empty());
    let governor = c.governor();

    // Batch size large enough that nothing flushes by size
    let (output, messages) = CollectingOutput::new("sink", 1000);
    c.add_output(output);
    c.add_input(ScriptInput::new("scripted", &["tail1", "tail2"]));
    c.add_input(Box::new(IdleInput));

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(c.run(shutdown.clone()));

    // Let the events make it into the open batch, then pull the plug
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(*messages.lock().unwrap(), vec!["tail1", "tail2"]);
    assert_eq!(governor.in_flight(), 0);
}
