//! ChatSurface trait: the abstraction over the chat platform's message API.
//!
//! The relay only ever posts new messages into a thread and updates messages
//! it posted earlier. Both calls may fail; the relay never retries them.

use async_trait::async_trait;
use crate::error::DeliveryError;
use crate::render::RenderPayload;
use crate::thread::{MessageRef, ThreadKey};

#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Post a new message as a reply in `thread`.
    async fn post(
        &self,
        thread: &ThreadKey,
        payload: &RenderPayload,
    ) -> std::result::Result<MessageRef, DeliveryError>;

    /// Replace the content of a previously posted message.
    async fn update(
        &self,
        message: &MessageRef,
        payload: &RenderPayload,
    ) -> std::result::Result<(), DeliveryError>;
}
