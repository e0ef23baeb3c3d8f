//! Decides, per inbound message, whether the bot answers.

use threadrelay_config::RelayConfig;
use threadrelay_core::thread::{InboundKind, InboundMessage};

/// What to do with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The bot's own message; do nothing.
    Ignore,
    /// Remember it in the thread's history without answering.
    IngestOnly,
    /// Answer in the thread.
    Respond,
}

/// Pure answer/remember/ignore policy. Evaluated before any agent call.
#[derive(Debug, Clone)]
pub struct ThreadConversationGate {
    bot_user_id: String,
    bot_id: Option<String>,
    trigger_phrase: String,
    respond_to_direct_messages: bool,
}

impl ThreadConversationGate {
    pub fn new(bot_user_id: impl Into<String>, trigger_phrase: impl Into<String>) -> Self {
        Self {
            bot_user_id: bot_user_id.into(),
            bot_id: None,
            trigger_phrase: trigger_phrase.into(),
            respond_to_direct_messages: false,
        }
    }

    pub fn from_config(bot_user_id: impl Into<String>, config: &RelayConfig) -> Self {
        Self::new(bot_user_id, &config.trigger_phrase)
            .with_direct_messages(config.respond_to_direct_messages)
    }

    pub fn with_direct_messages(mut self, enabled: bool) -> Self {
        self.respond_to_direct_messages = enabled;
        self
    }

    /// Also treat posts sent under the bot's integration id as its own.
    pub fn with_bot_id(mut self, bot_id: Option<String>) -> Self {
        self.bot_id = bot_id.filter(|id| !id.is_empty());
        self
    }

    pub fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    pub fn decide(&self, message: &InboundMessage) -> GateDecision {
        // The bot's own posts would otherwise loop forever
        if message.sender == self.bot_user_id || self.bot_id.as_deref() == Some(message.sender.as_str()) {
            return GateDecision::Ignore;
        }
        if message.kind == InboundKind::Mention {
            return GateDecision::Respond;
        }
        if !self.trigger_phrase.is_empty() && message.text.contains(&self.trigger_phrase) {
            return GateDecision::Respond;
        }
        if self.respond_to_direct_messages && message.is_direct_message() {
            return GateDecision::Respond;
        }
        GateDecision::IngestOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::inbound;

    fn gate() -> ThreadConversationGate {
        ThreadConversationGate::new("B1", "New signup by")
    }

    #[test]
    fn own_messages_are_ignored() {
        let own = inbound(InboundKind::Message, "B1", "New signup by Jane");
        assert_eq!(gate().decide(&own), GateDecision::Ignore);

        let own_mention = inbound(InboundKind::Mention, "B1", "<@B1>");
        assert_eq!(gate().decide(&own_mention), GateDecision::Ignore);
    }

    #[test]
    fn own_integration_posts_are_ignored() {
        let gate = gate().with_bot_id(Some("BBOT".into()));
        let own = inbound(InboundKind::Message, "BBOT", "New signup by Jane");
        assert_eq!(gate.decide(&own), GateDecision::Ignore);

        let other_bot = inbound(InboundKind::Message, "B9", "New signup by Jane");
        assert_eq!(gate.decide(&other_bot), GateDecision::Respond);
    }

    #[test]
    fn mentions_are_answered() {
        let msg = inbound(InboundKind::Mention, "U1", "<@B1> who is Jane?");
        assert_eq!(gate().decide(&msg), GateDecision::Respond);
    }

    #[test]
    fn trigger_phrase_is_answered() {
        let msg = inbound(InboundKind::Message, "B9", ":tada: New signup by Jane Doe (jane@acme.io)");
        assert_eq!(gate().decide(&msg), GateDecision::Respond);
    }

    #[test]
    fn trigger_phrase_is_case_sensitive() {
        let msg = inbound(InboundKind::Message, "U1", "new signup by jane");
        assert_eq!(gate().decide(&msg), GateDecision::IngestOnly);
    }

    #[test]
    fn ordinary_chatter_is_ingested() {
        let msg = inbound(InboundKind::Message, "U1", "what about their funding?");
        assert_eq!(gate().decide(&msg), GateDecision::IngestOnly);
    }

    #[test]
    fn direct_messages_only_when_enabled() {
        let mut dm = inbound(InboundKind::Message, "U1", "hello");
        dm.channel_type = Some("im".into());
        assert_eq!(gate().decide(&dm), GateDecision::IngestOnly);
        assert_eq!(gate().with_direct_messages(true).decide(&dm), GateDecision::Respond);
    }

    #[test]
    fn from_config_uses_relay_settings() {
        let config = RelayConfig {
            trigger_phrase: "Escalation:".into(),
            respond_to_direct_messages: true,
            ..RelayConfig::default()
        };
        let gate = ThreadConversationGate::from_config("B1", &config);
        assert_eq!(gate.bot_user_id(), "B1");
        let msg = inbound(InboundKind::Message, "U1", "Escalation: checkout is down");
        assert_eq!(gate.decide(&msg), GateDecision::Respond);
    }
}
