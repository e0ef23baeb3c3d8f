//! Conversation memory implementations for threadrelay.

pub mod in_memory;
pub mod noop;

pub use in_memory::InMemoryThreadMemory;
pub use noop::NoopMemory;

use std::sync::Arc;
use threadrelay_config::MemoryConfig;
use threadrelay_core::memory::ConversationMemory;

/// Build the backend named by `memory.backend`. Unknown names fall back to
/// the in-memory store; config validation rejects them before this point.
pub fn from_config(config: &MemoryConfig) -> Arc<dyn ConversationMemory> {
    match config.backend.as_str() {
        "none" => Arc::new(NoopMemory),
        _ => Arc::new(InMemoryThreadMemory::from_config(config)),
    }
}
