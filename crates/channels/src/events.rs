//! Slack Events API payloads.
//!
//! Slack POSTs an envelope per event. Only `url_verification` (the endpoint
//! handshake) and `event_callback` carry anything we act on.

use serde::Deserialize;
use serde_json::Value;
use threadrelay_core::error::GateError;
use threadrelay_core::thread::{InboundKind, InboundMessage};

/// Top-level Events API request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    /// Sent once when the request URL is configured; echo the challenge.
    UrlVerification { challenge: String },

    EventCallback {
        #[serde(default)]
        team_id: Option<String>,
        #[serde(default)]
        api_app_id: Option<String>,
        #[serde(default)]
        event_id: Option<String>,
        event: Value,
    },

    #[serde(other)]
    Unsupported,
}

/// Message subtypes that edit or remove an earlier message rather than say
/// something new.
const IGNORED_SUBTYPES: &[&str] = &["message_changed", "message_deleted"];

/// Turn the inner `event` of an `event_callback` into an [`InboundMessage`].
///
/// Returns `Ok(None)` for events that are valid but not conversation input
/// (edits and deletions).
pub fn parse_inbound(
    event: &Value,
    team_id: Option<&str>,
    app_id: Option<&str>,
) -> Result<Option<InboundMessage>, GateError> {
    let kind = match event["type"].as_str() {
        Some("message") => InboundKind::Message,
        Some("app_mention") => InboundKind::Mention,
        Some(other) => return Err(GateError::UnsupportedEvent(other.to_string())),
        None => return Err(GateError::MissingField("type")),
    };

    if let Some(subtype) = event["subtype"].as_str()
        && IGNORED_SUBTYPES.contains(&subtype)
    {
        return Ok(None);
    }

    let channel = str_field(event, "channel").ok_or(GateError::MissingField("channel"))?;
    let ts = str_field(event, "ts").ok_or(GateError::MissingField("ts"))?;
    // Integrations post without a user, identified by their bot id instead
    let sender = str_field(event, "user")
        .or_else(|| str_field(event, "bot_id"))
        .ok_or(GateError::MissingField("user"))?;

    Ok(Some(InboundMessage {
        kind,
        sender,
        text: str_field(event, "text").unwrap_or_default(),
        channel,
        ts,
        thread_ts: str_field(event, "thread_ts"),
        channel_type: str_field(event, "channel_type"),
        team_id: str_field(event, "team").or_else(|| team_id.map(String::from)),
        app_id: app_id.map(String::from),
    }))
}

fn str_field(event: &Value, key: &str) -> Option<String> {
    event
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_verification_envelope() {
        let envelope: SlackEnvelope = serde_json::from_value(json!({
            "token": "legacy",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
            "type": "url_verification"
        }))
        .unwrap();
        assert!(matches!(envelope, SlackEnvelope::UrlVerification { challenge } if challenge.starts_with("3eZ")));
    }

    #[test]
    fn unknown_envelope_type_is_unsupported() {
        let envelope: SlackEnvelope = serde_json::from_value(json!({"type": "app_rate_limited"})).unwrap();
        assert!(matches!(envelope, SlackEnvelope::Unsupported));
    }

    #[test]
    fn thread_reply_message() {
        let envelope: SlackEnvelope = serde_json::from_value(json!({
            "type": "event_callback",
            "team_id": "T1",
            "api_app_id": "A1",
            "event": {
                "type": "message",
                "user": "U1",
                "text": "what about their funding?",
                "channel": "C1",
                "channel_type": "channel",
                "ts": "1700000001.000200",
                "thread_ts": "1700000000.000100"
            }
        }))
        .unwrap();

        let SlackEnvelope::EventCallback { team_id, api_app_id, event, .. } = envelope else {
            panic!("Expected event_callback");
        };
        let msg = parse_inbound(&event, team_id.as_deref(), api_app_id.as_deref())
            .unwrap()
            .unwrap();
        assert_eq!(msg.kind, InboundKind::Message);
        assert_eq!(msg.sender, "U1");
        assert_eq!(msg.thread_key().thread_ts, "1700000000.000100");
        assert_eq!(msg.team_id.as_deref(), Some("T1"));
        assert_eq!(msg.app_id.as_deref(), Some("A1"));
    }

    #[test]
    fn app_mention_is_a_mention() {
        let msg = parse_inbound(
            &json!({"type": "app_mention", "user": "U1", "text": "<@B1> hi", "channel": "C1", "ts": "1.0"}),
            None,
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(msg.kind, InboundKind::Mention);
        assert!(msg.thread_ts.is_none());
    }

    #[test]
    fn integration_messages_use_bot_id() {
        let msg = parse_inbound(
            &json!({"type": "message", "subtype": "bot_message", "bot_id": "B9", "text": "New signup by Jane", "channel": "C1", "ts": "1.0"}),
            None,
            None,
        )
        .unwrap()
        .unwrap();
        assert_eq!(msg.sender, "B9");
    }

    #[test]
    fn edits_and_deletions_are_skipped() {
        for subtype in ["message_changed", "message_deleted"] {
            let event = json!({"type": "message", "subtype": subtype, "channel": "C1", "ts": "1.0"});
            assert!(parse_inbound(&event, None, None).unwrap().is_none());
        }
    }

    #[test]
    fn missing_fields_are_gate_errors() {
        let no_channel = json!({"type": "message", "user": "U1", "ts": "1.0"});
        assert!(matches!(parse_inbound(&no_channel, None, None), Err(GateError::MissingField("channel"))));

        let no_ts = json!({"type": "message", "user": "U1", "channel": "C1"});
        assert!(matches!(parse_inbound(&no_ts, None, None), Err(GateError::MissingField("ts"))));

        let no_sender = json!({"type": "message", "channel": "C1", "ts": "1.0"});
        assert!(matches!(parse_inbound(&no_sender, None, None), Err(GateError::MissingField("user"))));
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let msg = parse_inbound(&json!({"type": "message", "user": "U1", "channel": "C1", "ts": "1.0"}), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(msg.text, "");
    }

    #[test]
    fn other_event_types_are_unsupported() {
        let err = parse_inbound(&json!({"type": "reaction_added"}), None, None).unwrap_err();
        assert!(matches!(err, GateError::UnsupportedEvent(t) if t == "reaction_added"));
    }
}
