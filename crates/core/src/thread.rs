//! Thread addressing and inbound chat messages.

use serde::{Deserialize, Serialize};

/// Identifies one logical conversation thread.
///
/// Derived from the thread's root timestamp: a reply carries `thread_ts`,
/// a root message is its own thread. Every message of a thread resolves to
/// the same key, which addresses both history and new deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadKey {
    /// Chat channel the thread lives in
    pub channel: String,

    /// Timestamp of the thread's root message
    pub thread_ts: String,
}

impl ThreadKey {
    /// Derive the key for a message from its metadata.
    pub fn derive(channel: impl Into<String>, ts: &str, thread_ts: Option<&str>) -> Self {
        Self {
            channel: channel.into(),
            thread_ts: thread_ts.unwrap_or(ts).to_string(),
        }
    }
}

impl std::fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.channel, self.thread_ts)
    }
}

/// Handle to a message already posted, so it can be updated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel: String,
    pub ts: String,
}

/// How the message reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundKind {
    /// A plain channel/DM message
    Message,
    /// An explicit mention of the bot
    Mention,
}

/// A chat message that arrived from the platform, already validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub kind: InboundKind,

    /// Platform user (or integration) id of the sender
    pub sender: String,

    pub text: String,

    pub channel: String,

    /// The message's own timestamp
    pub ts: String,

    /// Root timestamp if the message is a thread reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,

    /// "channel", "group", "im", "mpim" (if the platform says)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

impl InboundMessage {
    /// The thread this message belongs to.
    pub fn thread_key(&self) -> ThreadKey {
        ThreadKey::derive(&self.channel, &self.ts, self.thread_ts.as_deref())
    }

    pub fn is_direct_message(&self) -> bool {
        self.channel_type.as_deref() == Some("im")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(ts: &str, thread_ts: Option<&str>) -> InboundMessage {
        InboundMessage {
            kind: InboundKind::Message,
            sender: "U123".into(),
            text: "hello".into(),
            channel: "C42".into(),
            ts: ts.into(),
            thread_ts: thread_ts.map(String::from),
            channel_type: Some("channel".into()),
            team_id: None,
            app_id: None,
        }
    }

    #[test]
    fn root_message_is_its_own_thread() {
        let key = message("1700000000.000100", None).thread_key();
        assert_eq!(key.thread_ts, "1700000000.000100");
        assert_eq!(key.channel, "C42");
    }

    #[test]
    fn replies_share_the_root_key() {
        let root = "1700000000.000100";
        let a = message("1700000001.000200", Some(root)).thread_key();
        let b = message("1700000002.000300", Some(root)).thread_key();
        assert_eq!(a, b);
        assert_eq!(a, message(root, None).thread_key());
    }

    #[test]
    fn display_joins_channel_and_ts() {
        let key = ThreadKey::derive("C42", "1.0", None);
        assert_eq!(key.to_string(), "C42:1.0");
    }

    #[test]
    fn direct_message_detection() {
        let mut msg = message("1.0", None);
        assert!(!msg.is_direct_message());
        msg.channel_type = Some("im".into());
        assert!(msg.is_direct_message());
    }
}
