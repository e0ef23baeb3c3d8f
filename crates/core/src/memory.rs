//! Conversation memory: per-thread history the agent reads and extends.
//!
//! Writes carry an explicit `persist` flag, and every backend must accept a
//! `persist = false` write as a no-op. A run that must not leave a trace in
//! the user-visible history (tool selection) gets a [`MemoryHandle::scratch`]
//! view instead: it has no thread to read or write, so its writes stop at the
//! handle and never reach a backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::error::MemoryError;
use crate::message::Role;
use crate::thread::ThreadKey;

/// One utterance in a thread's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Platform id of whoever said it (the bot's own id for answers)
    pub sender: String,

    pub role: Role,

    pub text: String,

    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The conversation memory backend.
///
/// Implementations: in-memory (default), none (no-op).
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// The backend name (e.g., "in_memory", "none").
    fn name(&self) -> &str;

    /// Append a turn to a thread. With `persist = false` the call is accepted
    /// and discarded.
    async fn append(
        &self,
        thread: &ThreadKey,
        turn: Turn,
        persist: bool,
    ) -> std::result::Result<(), MemoryError>;

    /// The most recent `limit` turns of a thread, oldest first.
    async fn history(
        &self,
        thread: &ThreadKey,
        limit: usize,
    ) -> std::result::Result<Vec<Turn>, MemoryError>;
}

/// The memory view handed to one agent run.
#[derive(Clone)]
pub struct MemoryHandle {
    backend: Option<Arc<dyn ConversationMemory>>,
    thread: Option<ThreadKey>,
    persist: bool,
}

impl MemoryHandle {
    /// Read and write the history of `thread`.
    pub fn thread(backend: Arc<dyn ConversationMemory>, thread: ThreadKey) -> Self {
        Self {
            backend: Some(backend),
            thread: Some(thread),
            persist: true,
        }
    }

    /// An empty view whose writes are discarded.
    ///
    /// No backend is attached: a selection run must neither see the thread's
    /// history nor add to it, and without a thread there is no key to write
    /// under.
    pub fn scratch() -> Self {
        Self {
            backend: None,
            thread: None,
            persist: false,
        }
    }

    pub fn persists(&self) -> bool {
        self.persist
    }

    pub fn thread_key(&self) -> Option<&ThreadKey> {
        self.thread.as_ref()
    }

    /// Thread history, or nothing for a scratch view.
    pub async fn history(&self, limit: usize) -> std::result::Result<Vec<Turn>, MemoryError> {
        match (&self.backend, &self.thread) {
            (Some(backend), Some(thread)) => backend.history(thread, limit).await,
            _ => Ok(Vec::new()),
        }
    }

    /// Record a turn, honouring this view's persist flag.
    pub async fn record(&self, turn: Turn) -> std::result::Result<(), MemoryError> {
        match (&self.backend, &self.thread) {
            (Some(backend), Some(thread)) => backend.append(thread, turn, self.persist).await,
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for MemoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHandle")
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("thread", &self.thread)
            .field("persist", &self.persist)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scratch_handle_reads_nothing_and_writes_nowhere() {
        let handle = MemoryHandle::scratch();
        assert!(!handle.persists());
        assert!(handle.thread_key().is_none());
        assert!(handle.history(10).await.unwrap().is_empty());
        assert!(handle.record(Turn::user("U1", "hi")).await.is_ok());
    }

    #[test]
    fn turn_constructors_set_roles() {
        assert_eq!(Turn::user("U1", "q").role, Role::User);
        assert_eq!(Turn::assistant("B1", "a").role, Role::Assistant);
    }
}
