//! Scripted collaborators for relay tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use threadrelay_core::error::{AgentError, DeliveryError, ToolError};
use threadrelay_core::event::{AgentEvent, EventSink};
use threadrelay_core::render::RenderPayload;
use threadrelay_core::thread::{InboundKind, InboundMessage, MessageRef, ThreadKey};
use threadrelay_core::tool::{Capability, Catalog, ToolDescriptor, ToolResult};
use threadrelay_core::{Agent, AgentOutput, AgentRequest, ChatSurface};

/// One chat operation as the surface saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Post { thread: ThreadKey, payload: RenderPayload, ts: String },
    Update { message: MessageRef, payload: RenderPayload },
}

impl SurfaceOp {
    pub fn text(&self) -> &str {
        match self {
            Self::Post { payload, .. } | Self::Update { payload, .. } => &payload.text,
        }
    }

    pub fn is_post(&self) -> bool {
        matches!(self, Self::Post { .. })
    }
}

/// Records every post and update. Posted messages get sequential ts values
/// (`"1"`, `"2"`, ...). Can be told to fail the n-th call of a method.
#[derive(Default)]
pub struct RecordingSurface {
    ops: Mutex<Vec<SurfaceOp>>,
    fail_post_at: Mutex<Option<usize>>,
    fail_update_at: Mutex<Option<usize>>,
}

impl RecordingSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the `n`-th post (1-based).
    pub fn fail_post(&self, n: usize) {
        *self.fail_post_at.lock().unwrap() = Some(n);
    }

    /// Fail the `n`-th update (1-based).
    pub fn fail_update(&self, n: usize) {
        *self.fail_update_at.lock().unwrap() = Some(n);
    }

    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<SurfaceOp> {
        self.ops().into_iter().filter(SurfaceOp::is_post).collect()
    }

    pub fn updates(&self) -> Vec<SurfaceOp> {
        self.ops().into_iter().filter(|op| !op.is_post()).collect()
    }
}

#[async_trait]
impl ChatSurface for RecordingSurface {
    async fn post(&self, thread: &ThreadKey, payload: &RenderPayload) -> Result<MessageRef, DeliveryError> {
        let mut ops = self.ops.lock().unwrap();
        let n = ops.iter().filter(|op| op.is_post()).count() + 1;
        if *self.fail_post_at.lock().unwrap() == Some(n) {
            return Err(DeliveryError::Rejected {
                method: "chat.postMessage".into(),
                reason: "channel_not_found".into(),
            });
        }
        let ts = n.to_string();
        ops.push(SurfaceOp::Post {
            thread: thread.clone(),
            payload: payload.clone(),
            ts: ts.clone(),
        });
        Ok(MessageRef {
            channel: thread.channel.clone(),
            ts,
        })
    }

    async fn update(&self, message: &MessageRef, payload: &RenderPayload) -> Result<(), DeliveryError> {
        let mut ops = self.ops.lock().unwrap();
        let n = ops.iter().filter(|op| !op.is_post()).count() + 1;
        if *self.fail_update_at.lock().unwrap() == Some(n) {
            return Err(DeliveryError::Rejected {
                method: "chat.update".into(),
                reason: "message_not_found".into(),
            });
        }
        ops.push(SurfaceOp::Update {
            message: message.clone(),
            payload: payload.clone(),
        });
        Ok(())
    }
}

/// What one scripted run does.
pub struct Script {
    pub events: Vec<AgentEvent>,
    pub outcome: Result<String, String>,
}

impl Script {
    pub fn answer(text: &str) -> Self {
        Self {
            events: Vec::new(),
            outcome: Ok(text.into()),
        }
    }

    pub fn with_events(mut self, events: Vec<AgentEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn failure(message: &str) -> Self {
        Self {
            events: Vec::new(),
            outcome: Err(message.into()),
        }
    }
}

/// An agent that plays back scripts, one per run, and keeps the requests.
#[derive(Default)]
pub struct ScriptedAgent {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<AgentRequest>>,
}

impl ScriptedAgent {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn run(&self, request: AgentRequest, sink: &mut dyn EventSink) -> Result<AgentOutput, AgentError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::failure("script exhausted"));

        for event in &script.events {
            sink.on_event(event).await?;
        }
        script
            .outcome
            .map(|text| AgentOutput { text })
            .map_err(AgentError::Run)
    }
}

struct NoopCapability;

#[async_trait]
impl Capability for NoopCapability {
    fn name(&self) -> &str {
        "noop"
    }

    fn description(&self) -> &str {
        "Does nothing"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn invoke(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: String::new(),
            data: None,
        })
    }
}

pub fn descriptor(name: &str, description: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, description, Arc::new(NoopCapability))
}

/// The three tools of the default deployment, in catalog order.
pub fn sample_catalog() -> Catalog {
    Catalog::new()
        .with(descriptor("web_scraper", "Can be used to scrape information from webpages."))
        .with(descriptor("web_search", "Can be used to search the web for information."))
        .with(descriptor("linkedin_client", "Can be used to consult Linkedin for information."))
}

pub fn inbound(kind: InboundKind, sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        kind,
        sender: sender.into(),
        text: text.into(),
        channel: "C1".into(),
        ts: "1700000000.000100".into(),
        thread_ts: None,
        channel_type: Some("channel".into()),
        team_id: Some("T1".into()),
        app_id: Some("A1".into()),
    }
}
