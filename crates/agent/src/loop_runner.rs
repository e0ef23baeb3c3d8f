//! The agent reasoning loop implementation.

use std::sync::Arc;
use threadrelay_config::AppConfig;
use threadrelay_core::error::AgentError;
use threadrelay_core::event::{ActionDescriptor, AgentEvent, EventSink};
use threadrelay_core::memory::Turn;
use threadrelay_core::message::{Message, MessageToolCall, Role};
use threadrelay_core::provider::{Provider, ProviderRequest};
use threadrelay_core::tool::{ToolCall, ToolDescriptor};
use threadrelay_core::{Agent, AgentOutput, AgentRequest};
use tracing::{debug, info, warn};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant taking part in a Slack \
conversation. Answer concisely using Slack markdown. Use the available tools when they help \
you give an accurate answer.";

const MAX_ITERATIONS_REPLY: &str =
    "I've reached the maximum number of tool call iterations. Please provide further guidance.";

/// An [`Agent`] backed by an LLM provider.
pub struct LlmAgent {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    model: String,

    temperature: f32,

    max_tokens: Option<u32>,

    system_prompt: String,

    /// Maximum tool call iterations per run
    max_iterations: u32,

    /// How many past turns of the thread to replay
    history_limit: usize,

    /// Sender id stamped on remembered answers
    speaker_id: String,
}

impl LlmAgent {
    /// Create a new agent.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            history_limit: 50,
            speaker_id: "assistant".into(),
        }
    }

    /// Create an agent with the model and loop settings from configuration.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let mut agent = Self::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_iterations(config.agent.max_iterations)
            .with_history_limit(config.agent.history_limit);
        if let Some(prompt) = &config.agent.system_prompt {
            agent = agent.with_system_prompt(prompt);
        }
        agent
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of tool call iterations.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the sender id recorded with the agent's own answers (the bot user).
    pub fn with_speaker_id(mut self, id: impl Into<String>) -> Self {
        self.speaker_id = id.into();
        self
    }

    /// System prompt with the request's rules appended.
    fn system_message(&self, rules: &[String]) -> Message {
        if rules.is_empty() {
            return Message::system(&self.system_prompt);
        }
        let mut prompt = format!("{}\n\nRules:", self.system_prompt);
        for rule in rules {
            prompt.push_str("\n- ");
            prompt.push_str(rule);
        }
        Message::system(prompt)
    }

    /// One LLM turn. With streaming on, text deltas are forwarded to the sink
    /// as they arrive.
    async fn call_llm(
        &self,
        request: ProviderRequest,
        sink: &mut dyn EventSink,
    ) -> Result<(String, Vec<MessageToolCall>), AgentError> {
        if !request.stream {
            let response = self.provider.complete(request).await?;
            return Ok((response.message.content, response.message.tool_calls));
        }

        let mut stream_rx = self.provider.stream(request).await?;
        let mut content = String::new();
        let mut tool_calls: Vec<MessageToolCall> = Vec::new();

        while let Some(chunk) = stream_rx.recv().await {
            let chunk = chunk?;
            if let Some(text) = chunk.content.filter(|t| !t.is_empty()) {
                content.push_str(&text);
                sink.on_event(&AgentEvent::text_chunk(text)).await?;
            }
            tool_calls.extend(chunk.tool_calls);
            if chunk.done {
                break;
            }
        }

        Ok((content, tool_calls))
    }

    /// Run every tool call of one step. Failures are reported back to the
    /// model as tool output so it can recover.
    async fn execute_tools(
        tools: &[ToolDescriptor],
        tool_calls: &[MessageToolCall],
        messages: &mut Vec<Message>,
    ) {
        for tc in tool_calls {
            let call = ToolCall {
                id: tc.id.clone(),
                name: tc.name.clone(),
                arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
            };

            let output = match tools.iter().find(|d| d.name == tc.name) {
                Some(descriptor) => match descriptor.execute(&call).await {
                    Ok(result) => {
                        debug!(tool = %tc.name, success = result.success, "Tool executed");
                        result.output
                    }
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, "Tool execution failed");
                        format!("Error: {e}")
                    }
                },
                None => {
                    warn!(tool = %tc.name, "Model called a tool it was not given");
                    format!("Error: tool '{}' is not available", tc.name)
                }
            };

            messages.push(Message::tool_result(&tc.id, output));
        }
    }

    async fn remember(&self, request: &AgentRequest, answer: &str) -> Result<(), AgentError> {
        let sender = request.sender.as_deref().unwrap_or("user");
        request.memory.record(Turn::user(sender, &request.input)).await?;
        request
            .memory
            .record(Turn::assistant(&self.speaker_id, answer))
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Agent for LlmAgent {
    async fn run(
        &self,
        request: AgentRequest,
        sink: &mut dyn EventSink,
    ) -> Result<AgentOutput, AgentError> {
        info!(
            thread = ?request.memory.thread_key().map(ToString::to_string),
            tools = request.tools.len(),
            stream = request.stream,
            "Agent run started"
        );

        sink.on_event(&AgentEvent::RunStarted).await?;
        if !request.tools.is_empty() {
            sink.on_event(&AgentEvent::ToolsRequested {
                tools: request.tools.clone(),
            })
            .await?;
        }

        let mut messages = vec![self.system_message(&request.rules)];
        for turn in request.memory.history(self.history_limit).await? {
            messages.push(match turn.role {
                Role::Assistant => Message::assistant(turn.text),
                _ => Message::user(turn.text),
            });
        }
        messages.push(Message::user(&request.input));

        let tool_definitions: Vec<_> = request.tools.iter().map(|d| d.to_definition()).collect();

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "Agent loop iteration");

            let provider_request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
                stream: request.stream,
                stop: vec![],
            };

            let (content, tool_calls) = self.call_llm(provider_request, sink).await?;

            if tool_calls.is_empty() {
                self.remember(&request, &content).await?;
                return Ok(AgentOutput { text: content });
            }

            if request.stream {
                for tc in &tool_calls {
                    sink.on_event(&AgentEvent::action_chunk(format!("{}({})", tc.name, tc.arguments)))
                        .await?;
                }
            }

            sink.on_event(&AgentEvent::SubtaskStarted {
                thought: Some(content.clone()).filter(|t| !t.trim().is_empty()),
                actions: tool_calls.iter().map(|tc| ActionDescriptor::new(&tc.name)).collect(),
            })
            .await?;

            let mut assistant = Message::assistant(content);
            assistant.tool_calls = tool_calls.clone();
            messages.push(assistant);

            Self::execute_tools(&request.tools, &tool_calls, &mut messages).await;

            sink.on_event(&AgentEvent::SubtaskFinished).await?;
        }

        warn!(max_iterations = self.max_iterations, "Max tool iterations reached");
        self.remember(&request, MAX_ITERATIONS_REPLY).await?;
        Ok(AgentOutput {
            text: MAX_ITERATIONS_REPLY.into(),
        })
    }
}
