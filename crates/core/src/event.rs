//! Agent lifecycle events and the sink they are delivered to.
//!
//! The agent emits events in the order they happen. A sink receives them
//! sequentially, one at a time, and never sees them reordered.

use async_trait::async_trait;
use crate::error::DeliveryError;
use crate::tool::ToolDescriptor;

/// Display name of a pending tool invocation (e.g. `web_search`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionDescriptor(pub String);

impl ActionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// All lifecycle events an agent run produces.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// The run has begun
    RunStarted,

    /// A reasoning step that is about to invoke tools
    SubtaskStarted {
        thought: Option<String>,
        actions: Vec<ActionDescriptor>,
    },

    /// The tools of the current step returned
    SubtaskFinished,

    /// The tool set the run was handed
    ToolsRequested { tools: Vec<ToolDescriptor> },

    /// Incremental fragment of a streaming answer
    Chunk {
        text: String,
        meta: serde_json::Map<String, serde_json::Value>,
    },
}

impl AgentEvent {
    /// A streamed text fragment.
    pub fn text_chunk(text: impl Into<String>) -> Self {
        Self::Chunk {
            text: text.into(),
            meta: chunk_meta("text"),
        }
    }

    /// A streamed fragment describing a tool call rather than answer text.
    pub fn action_chunk(text: impl Into<String>) -> Self {
        Self::Chunk {
            text: text.into(),
            meta: chunk_meta("action"),
        }
    }

    pub fn is_chunk(&self) -> bool {
        matches!(self, Self::Chunk { .. })
    }

    /// Short name for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::SubtaskStarted { .. } => "subtask_started",
            Self::SubtaskFinished => "subtask_finished",
            Self::ToolsRequested { .. } => "tools_requested",
            Self::Chunk { .. } => "chunk",
        }
    }
}

fn chunk_meta(kind: &str) -> serde_json::Map<String, serde_json::Value> {
    let mut meta = serde_json::Map::new();
    meta.insert("type".into(), serde_json::Value::String(kind.into()));
    meta
}

/// Receives the events of one agent run.
#[async_trait]
pub trait EventSink: Send {
    async fn on_event(&mut self, event: &AgentEvent) -> std::result::Result<(), DeliveryError>;
}

/// Discards every event. Used for runs whose progress must stay invisible.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn on_event(&mut self, _event: &AgentEvent) -> std::result::Result<(), DeliveryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_constructors_tag_meta() {
        match AgentEvent::action_chunk("web_search({})") {
            AgentEvent::Chunk { meta, .. } => assert_eq!(meta["type"], "action"),
            _ => panic!("Expected Chunk event"),
        }
        match AgentEvent::text_chunk("Hello") {
            AgentEvent::Chunk { text, meta } => {
                assert_eq!(text, "Hello");
                assert_eq!(meta["type"], "text");
            }
            _ => panic!("Expected Chunk event"),
        }
    }

    #[test]
    fn event_type_names() {
        assert_eq!(AgentEvent::RunStarted.event_type(), "run_started");
        assert_eq!(AgentEvent::SubtaskFinished.event_type(), "subtask_finished");
        assert_eq!(AgentEvent::ToolsRequested { tools: vec![] }.event_type(), "tools_requested");
        assert!(AgentEvent::text_chunk("x").is_chunk());
        assert!(!AgentEvent::RunStarted.is_chunk());
    }

    #[tokio::test]
    async fn null_sink_accepts_everything() {
        let mut sink = NullSink;
        assert!(sink.on_event(&AgentEvent::RunStarted).await.is_ok());
    }

    #[test]
    fn action_descriptor_displays_name() {
        assert_eq!(ActionDescriptor::new("search").to_string(), "search");
    }
}
