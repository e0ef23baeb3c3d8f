//! Agent events to chat payloads.
//!
//! [`classify`] decides what, if anything, a single event looks like in the
//! thread. It is pure and total: every event maps to a payload or to nothing.

use async_trait::async_trait;
use std::sync::Arc;
use threadrelay_core::channel::ChatSurface;
use threadrelay_core::error::DeliveryError;
use threadrelay_core::event::{AgentEvent, EventSink};
use threadrelay_core::render::{Block, RenderPayload};
use threadrelay_core::thread::ThreadKey;
use tracing::debug;

/// Render one agent event, or `None` if it has no visible form.
pub fn classify(event: &AgentEvent) -> Option<RenderPayload> {
    match event {
        AgentEvent::RunStarted => Some(RenderPayload::with_blocks(
            "Starting...",
            vec![Block::emoji(":envelope:", "Reading the data...")],
        )),

        AgentEvent::SubtaskStarted { actions, .. } if actions.is_empty() => None,
        AgentEvent::SubtaskStarted { thought, actions } => {
            let mut blocks = vec![Block::thought(thought.as_deref().unwrap_or("Thought..."))];
            blocks.extend(actions.iter().map(|a| Block::action(a.to_string())));
            Some(RenderPayload::with_blocks("Thought...", blocks))
        }

        AgentEvent::SubtaskFinished => Some(RenderPayload::with_blocks(
            "Finishing...",
            vec![Block::emoji(":pencil:", "Analyzing the data...")],
        )),

        AgentEvent::ToolsRequested { tools } if tools.is_empty() => None,
        AgentEvent::ToolsRequested { tools } => Some(RenderPayload::with_blocks(
            "Tools",
            tools
                .iter()
                .map(|t| Block::action(format!("I need the {}", t.name)))
                .collect(),
        )),

        // Tool-call fragments are not part of the answer text
        AgentEvent::Chunk { meta, .. } if is_action(meta) => None,
        AgentEvent::Chunk { text, .. } => Some(RenderPayload::text(text.clone())),
    }
}

fn is_action(meta: &serde_json::Map<String, serde_json::Value>) -> bool {
    meta.get("type").and_then(|t| t.as_str()) == Some("action")
}

/// Posts every classified lifecycle event as a new reply in the thread.
///
/// Used when the answer is not streamed. Chunk events are not its concern
/// and are skipped.
pub struct ProgressSink {
    surface: Arc<dyn ChatSurface>,
    thread: ThreadKey,
    posted: usize,
}

impl ProgressSink {
    pub fn new(surface: Arc<dyn ChatSurface>, thread: ThreadKey) -> Self {
        Self {
            surface,
            thread,
            posted: 0,
        }
    }

    /// Number of replies posted so far.
    pub fn posted(&self) -> usize {
        self.posted
    }
}

#[async_trait]
impl EventSink for ProgressSink {
    async fn on_event(&mut self, event: &AgentEvent) -> Result<(), DeliveryError> {
        if event.is_chunk() {
            return Ok(());
        }
        let Some(payload) = classify(event) else {
            debug!(event = event.event_type(), "Event has no visible form");
            return Ok(());
        };
        self.surface.post(&self.thread, &payload).await?;
        self.posted += 1;
        Ok(())
    }
}
