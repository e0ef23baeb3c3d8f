//! Shared test helpers for agent loop tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use threadrelay_core::error::{DeliveryError, ProviderError, ToolError};
use threadrelay_core::event::{AgentEvent, EventSink};
use threadrelay_core::message::{Message, MessageToolCall};
use threadrelay_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use threadrelay_core::tool::{Capability, ToolDescriptor, ToolResult};

/// A provider that returns a sequence of scripted responses and keeps every
/// request it was sent.
///
/// Each call to `complete` returns the next response in the queue, or an
/// API error once the script runs out.
pub struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// A provider that first returns tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, thought: &str, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls, thought),
            make_text_response(answer),
        ])
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "script exhausted".into(),
            });
        }
        Ok(responses.remove(0))
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    make_tool_call_response(vec![], text)
}

/// Create a response with tool calls and optional thought content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut msg = Message::assistant(thought);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
        metadata: serde_json::Map::new(),
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// Echoes its arguments back as output.
struct EchoCapability;

#[async_trait]
impl Capability for EchoCapability {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes its arguments"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: arguments.to_string(),
            data: None,
        })
    }
}

pub fn echo_descriptor(name: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, format!("{name} tool"), Arc::new(EchoCapability))
}

/// Keeps every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AgentEvent>,
}

impl RecordingSink {
    pub fn types(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .filter(|e| !e.is_chunk())
            .map(|e| e.event_type())
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn on_event(&mut self, event: &AgentEvent) -> Result<(), DeliveryError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Rejects every event.
pub struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn on_event(&mut self, _event: &AgentEvent) -> Result<(), DeliveryError> {
        Err(DeliveryError::Network("connection reset".into()))
    }
}
