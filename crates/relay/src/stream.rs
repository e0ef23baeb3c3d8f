//! Batched delivery of a streamed answer.
//!
//! The first chunk is posted as a new reply. Later chunks accumulate and the
//! same message is updated with the full text every `flush_threshold`
//! chunks, so a long answer costs a bounded number of API calls.

use async_trait::async_trait;
use std::sync::Arc;
use threadrelay_core::channel::ChatSurface;
use threadrelay_core::error::DeliveryError;
use threadrelay_core::event::{AgentEvent, EventSink};
use threadrelay_core::render::RenderPayload;
use threadrelay_core::thread::{MessageRef, ThreadKey};
use tracing::{debug, trace};

use crate::classifier::classify;

/// State of the message being streamed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryBatch {
    /// The reply that receives updates
    pub message: MessageRef,
    /// Every chunk so far, concatenated in arrival order
    pub accumulated_text: String,
    /// Chunks not yet reflected in the posted message
    pub pending_count: usize,
    pub flush_threshold: usize,
}

/// Streams chunk events into a single continuously updated reply.
///
/// Owned by one response; consumed by [`BatchedStreamDriver::finish`].
pub struct BatchedStreamDriver {
    surface: Arc<dyn ChatSurface>,
    thread: ThreadKey,
    flush_threshold: usize,
    batch: Option<DeliveryBatch>,
}

impl BatchedStreamDriver {
    /// A threshold below 1 is raised to 1.
    pub fn new(surface: Arc<dyn ChatSurface>, thread: ThreadKey, flush_threshold: usize) -> Self {
        Self {
            surface,
            thread,
            flush_threshold: flush_threshold.max(1),
            batch: None,
        }
    }

    /// The open batch, once the first chunk has been posted.
    pub fn batch(&self) -> Option<&DeliveryBatch> {
        self.batch.as_ref()
    }

    /// Deliver one rendered chunk.
    pub async fn push(&mut self, text: &str) -> Result<(), DeliveryError> {
        let next = match self.batch.take() {
            Some(mut batch) => {
                batch.accumulated_text.push_str(text);
                batch.pending_count += 1;
                batch
            }
            None => {
                let message = self.surface.post(&self.thread, &RenderPayload::text(text)).await?;
                debug!(thread = %self.thread, ts = %message.ts, "Opened stream message");
                DeliveryBatch {
                    message,
                    accumulated_text: text.to_string(),
                    pending_count: 1,
                    flush_threshold: self.flush_threshold,
                }
            }
        };
        let batch = self.batch.insert(next);

        if batch.pending_count >= batch.flush_threshold {
            trace!(chars = batch.accumulated_text.len(), "Flushing stream batch");
            self.surface
                .update(&batch.message, &RenderPayload::text(&batch.accumulated_text))
                .await?;
            batch.pending_count = 0;
        }
        Ok(())
    }

    /// Flush whatever is pending. Returns the streamed message, if any chunk
    /// arrived at all.
    pub async fn finish(self) -> Result<Option<MessageRef>, DeliveryError> {
        let Some(batch) = self.batch else {
            return Ok(None);
        };
        if batch.pending_count > 0 {
            self.surface
                .update(&batch.message, &RenderPayload::text(&batch.accumulated_text))
                .await?;
        }
        Ok(Some(batch.message))
    }
}

#[async_trait]
impl EventSink for BatchedStreamDriver {
    async fn on_event(&mut self, event: &AgentEvent) -> Result<(), DeliveryError> {
        if !event.is_chunk() {
            return Ok(());
        }
        match classify(event) {
            Some(payload) => self.push(&payload.text).await,
            None => Ok(()),
        }
    }
}
