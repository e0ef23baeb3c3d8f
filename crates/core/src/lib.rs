//! # threadrelay core
//!
//! Domain types, traits, and error definitions for threadrelay, the relay
//! between an LLM agent's event stream and a Slack conversation.
//! This crate has **zero framework dependencies**; it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator (agent, chat surface, conversation memory, rules
//! engine, capability) is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/recording stubs
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod channel;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod provider;
pub mod render;
pub mod thread;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{
    Agent, AgentOutput, AgentRequest, Ruleset, RulesetFlags, RulesetQuery, RulesetSource,
    StaticRulesets,
};
pub use channel::ChatSurface;
pub use error::{Error, Result};
pub use event::{ActionDescriptor, AgentEvent, EventSink, NullSink};
pub use memory::{ConversationMemory, MemoryHandle, Turn};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk};
pub use render::{Block, RenderPayload};
pub use thread::{InboundKind, InboundMessage, MessageRef, ThreadKey};
pub use tool::{Capability, Catalog, ToolCall, ToolDescriptor, ToolResult};
