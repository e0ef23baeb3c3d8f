//! In-memory thread history. The default backend; lost on restart.
//!
//! Bounded on both axes: each thread keeps its most recent turns, and once
//! the thread limit is reached the least recently active thread is evicted.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use threadrelay_config::MemoryConfig;
use threadrelay_core::error::MemoryError;
use threadrelay_core::memory::{ConversationMemory, Turn};
use threadrelay_core::thread::ThreadKey;
use tokio::sync::RwLock;
use tracing::{debug, trace};

struct ThreadLog {
    turns: VecDeque<Turn>,
    /// Value of the write counter at the last append
    last_write: u64,
}

#[derive(Default)]
struct Store {
    threads: HashMap<ThreadKey, ThreadLog>,
    writes: u64,
}

/// Thread histories kept in a map keyed by [`ThreadKey`].
#[derive(Clone)]
pub struct InMemoryThreadMemory {
    store: Arc<RwLock<Store>>,
    max_turns_per_thread: usize,
    max_threads: usize,
}

impl Default for InMemoryThreadMemory {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}

impl InMemoryThreadMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits below 1 are raised to 1.
    pub fn with_limits(max_turns_per_thread: usize, max_threads: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            max_turns_per_thread: max_turns_per_thread.max(1),
            max_threads: max_threads.max(1),
        }
    }

    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::with_limits(config.max_turns_per_thread, config.max_threads)
    }

    /// Number of threads with at least one stored turn.
    pub async fn thread_count(&self) -> usize {
        self.store.read().await.threads.len()
    }

    /// Number of turns stored for `thread`.
    pub async fn stored_turns(&self, thread: &ThreadKey) -> usize {
        self.store
            .read()
            .await
            .threads
            .get(thread)
            .map_or(0, |log| log.turns.len())
    }
}

impl Store {
    fn evict_idlest(&mut self) {
        let idlest = self
            .threads
            .iter()
            .min_by_key(|(_, log)| log.last_write)
            .map(|(key, _)| key.clone());
        if let Some(key) = idlest {
            debug!(thread = %key, "Evicting idle thread history");
            self.threads.remove(&key);
        }
    }
}

#[async_trait]
impl ConversationMemory for InMemoryThreadMemory {
    fn name(&self) -> &str { "in_memory" }

    async fn append(&self, thread: &ThreadKey, turn: Turn, persist: bool) -> Result<(), MemoryError> {
        if !persist {
            trace!(thread = %thread, "Discarding non-persistent turn");
            return Ok(());
        }
        let mut store = self.store.write().await;
        if !store.threads.contains_key(thread) && store.threads.len() >= self.max_threads {
            store.evict_idlest();
        }
        store.writes += 1;
        let now = store.writes;

        let log = store.threads.entry(thread.clone()).or_insert_with(|| ThreadLog {
            turns: VecDeque::new(),
            last_write: now,
        });
        log.last_write = now;
        log.turns.push_back(turn);
        while log.turns.len() > self.max_turns_per_thread {
            log.turns.pop_front();
        }
        Ok(())
    }

    async fn history(&self, thread: &ThreadKey, limit: usize) -> Result<Vec<Turn>, MemoryError> {
        let store = self.store.read().await;
        let Some(log) = store.threads.get(thread) else {
            return Ok(Vec::new());
        };
        let skip = log.turns.len().saturating_sub(limit);
        Ok(log.turns.iter().skip(skip).cloned().collect())
    }
}
