//! No-op memory backend: disables conversation history entirely.

use async_trait::async_trait;
use threadrelay_core::error::MemoryError;
use threadrelay_core::memory::{ConversationMemory, Turn};
use threadrelay_core::thread::ThreadKey;

/// A memory backend that remembers nothing.
pub struct NoopMemory;

#[async_trait]
impl ConversationMemory for NoopMemory {
    fn name(&self) -> &str { "none" }

    async fn append(&self, _thread: &ThreadKey, _turn: Turn, _persist: bool) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn history(&self, _thread: &ThreadKey, _limit: usize) -> Result<Vec<Turn>, MemoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forgets_everything() {
        let key = ThreadKey::derive("C1", "1.0", None);
        NoopMemory.append(&key, Turn::user("U1", "hello"), true).await.unwrap();
        assert!(NoopMemory.history(&key, 10).await.unwrap().is_empty());
        assert_eq!(NoopMemory.name(), "none");
    }
}
