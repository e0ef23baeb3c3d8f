//! Per-message response flow.

use std::sync::Arc;
use threadrelay_config::RelayConfig;
use threadrelay_core::error::{AgentError, DeliveryError};
use threadrelay_core::memory::{ConversationMemory, MemoryHandle, Turn};
use threadrelay_core::render::RenderPayload;
use threadrelay_core::thread::{InboundMessage, MessageRef, ThreadKey};
use threadrelay_core::tool::Catalog;
use threadrelay_core::{Agent, AgentRequest, ChatSurface, RulesetFlags, RulesetQuery, RulesetSource};
use tracing::{debug, error, info, warn};

use crate::classifier::ProgressSink;
use crate::gate::{GateDecision, ThreadConversationGate};
use crate::segment::segment_markdown;
use crate::selector::ToolSelector;
use crate::stream::BatchedStreamDriver;

/// Everything a response needs, built once at startup and shared by every
/// handler task.
pub struct RelayContext {
    pub surface: Arc<dyn ChatSurface>,
    pub agent: Arc<dyn Agent>,
    pub memory: Arc<dyn ConversationMemory>,
    pub rulesets: Arc<dyn RulesetSource>,
    pub catalog: Catalog,
    pub gate: ThreadConversationGate,
    pub settings: RelayConfig,
}

/// How one inbound message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Ignored,
    Ingested,
    /// Answered; carries the placeholder that anchors the response
    Responded(MessageRef),
    /// The run failed and the placeholder now shows the error
    Failed(MessageRef),
}

pub struct ResponseOrchestrator {
    context: Arc<RelayContext>,
    selector: ToolSelector,
}

impl ResponseOrchestrator {
    pub fn new(context: Arc<RelayContext>) -> Self {
        let selector = ToolSelector::new(context.agent.clone());
        Self { context, selector }
    }

    pub fn context(&self) -> &RelayContext {
        &self.context
    }

    /// Gate the message, then remember it or answer it.
    ///
    /// Only delivery failures that leave the thread without any visible
    /// outcome are returned: a failed placeholder post, or a failed error
    /// update after the run itself failed.
    pub async fn handle(&self, message: InboundMessage) -> Result<HandleOutcome, DeliveryError> {
        let thread = message.thread_key();
        let decision = self.context.gate.decide(&message);
        debug!(%thread, sender = %message.sender, ?decision, "Gated inbound message");

        match decision {
            GateDecision::Ignore => Ok(HandleOutcome::Ignored),
            GateDecision::IngestOnly => {
                self.ingest(&thread, &message).await;
                Ok(HandleOutcome::Ingested)
            }
            GateDecision::Respond => self.respond(&thread, &message).await,
        }
    }

    async fn ingest(&self, thread: &ThreadKey, message: &InboundMessage) {
        let turn = Turn::user(&message.sender, &message.text);
        if let Err(e) = self.context.memory.append(thread, turn, true).await {
            warn!(%thread, error = %e, "Failed to remember thread message");
        }
    }

    async fn respond(&self, thread: &ThreadKey, message: &InboundMessage) -> Result<HandleOutcome, DeliveryError> {
        let placeholder = self.context.surface.post(thread, &RenderPayload::thinking()).await?;
        info!(%thread, placeholder = %placeholder.ts, "Responding");

        match self.run_response(thread, message, &placeholder).await {
            Ok(()) => Ok(HandleOutcome::Responded(placeholder)),
            Err(e) => {
                error!(%thread, error = %e, "Response failed");
                self.context
                    .surface
                    .update(
                        &placeholder,
                        &RenderPayload::error(&e.to_string(), self.context.settings.max_block_chars),
                    )
                    .await?;
                Ok(HandleOutcome::Failed(placeholder))
            }
        }
    }

    async fn run_response(
        &self,
        thread: &ThreadKey,
        message: &InboundMessage,
        placeholder: &MessageRef,
    ) -> Result<(), AgentError> {
        let ctx = &self.context;

        let query = RulesetQuery {
            user_id: message.sender.clone(),
            channel_id: message.channel.clone(),
            team_id: message.team_id.clone(),
            app_id: message.app_id.clone(),
        };
        let rulesets = ctx.rulesets.resolve(&query).await?;
        let flags = RulesetFlags::from_rulesets(&rulesets);
        let rules: Vec<String> = rulesets.into_iter().flat_map(|r| r.rules).collect();
        debug!(stream = flags.stream, toolbox = flags.enable_toolbox, rules = rules.len(), "Resolved rulesets");

        let tools = self
            .selector
            .select(&message.text, &ctx.catalog, flags.enable_toolbox)
            .await?;

        let request = AgentRequest::new(&message.text, MemoryHandle::thread(ctx.memory.clone(), thread.clone()))
            .with_sender(&message.sender)
            .with_rules(rules)
            .with_tools(tools)
            .with_stream(flags.stream);

        if flags.stream {
            let mut driver = BatchedStreamDriver::new(ctx.surface.clone(), thread.clone(), ctx.settings.flush_threshold);
            let output = ctx.agent.run(request, &mut driver).await?;
            // An answer that arrived without chunks still has to be shown
            if driver.finish().await?.is_none() {
                self.deliver(thread, &output.text).await?;
            }
        } else {
            let mut sink = ProgressSink::new(ctx.surface.clone(), thread.clone());
            let output = ctx.agent.run(request, &mut sink).await?;
            debug!(progress_posts = sink.posted(), "Run finished");
            self.deliver(thread, &output.text).await?;
        }

        if ctx.settings.resolve_placeholder {
            ctx.surface.update(placeholder, &RenderPayload::done()).await?;
        }
        Ok(())
    }

    /// Post the final answer as one or more markdown replies.
    async fn deliver(&self, thread: &ThreadKey, answer: &str) -> Result<(), DeliveryError> {
        let settings = &self.context.settings;
        let groups = segment_markdown(answer, settings.max_block_chars, settings.max_blocks_per_message);
        if groups.is_empty() {
            warn!(%thread, "Agent produced an empty answer");
        }
        for blocks in groups {
            let text = blocks.iter().map(|b| b.text()).collect::<Vec<_>>().join("\n\n");
            self.context
                .surface
                .post(thread, &RenderPayload::with_blocks(text, blocks))
                .await?;
        }
        Ok(())
    }
}
