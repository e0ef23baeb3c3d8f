//! Slack Web API chat surface.
//!
//! Posts thread replies with `chat.postMessage` and edits them with
//! `chat.update`. Every call is a JSON POST with the bot token as bearer;
//! Slack answers HTTP 200 with `{"ok": false, "error": ...}` on failure.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use threadrelay_config::SlackConfig;
use threadrelay_core::channel::ChatSurface;
use threadrelay_core::error::DeliveryError;
use threadrelay_core::render::RenderPayload;
use threadrelay_core::thread::{MessageRef, ThreadKey};
use tracing::{debug, warn};

use crate::blocks::render_blocks;

/// Who the bot token belongs to, as reported by `auth.test`.
///
/// Both ids mark the bot's own posts: `user_id` on ordinary messages,
/// `bot_id` on posts that carry no user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: String,
    pub bot_id: Option<String>,
}

impl BotIdentity {
    fn from_auth_test(response: &Value) -> Result<Self, DeliveryError> {
        let user_id = string_field(response, "user_id")
            .ok_or_else(|| DeliveryError::InvalidResponse("auth.test: missing user_id".into()))?;
        Ok(Self {
            user_id,
            bot_id: string_field(response, "bot_id"),
        })
    }
}

/// Slack Web API client implementing [`ChatSurface`].
pub struct SlackSurface {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl SlackSurface {
    pub fn new(api_url: impl Into<String>, bot_token: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DeliveryError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        })
    }

    /// Build the surface from the `[slack]` section. `None` without a bot token.
    pub fn from_config(config: &SlackConfig) -> Result<Option<Self>, DeliveryError> {
        match &config.bot_token {
            Some(token) => Self::new(&config.api_url, token).map(Some),
            None => Ok(None),
        }
    }

    /// Resolve the bot's own user id.
    pub async fn auth_test(&self) -> Result<BotIdentity, DeliveryError> {
        let response = self.call("auth.test", &json!({})).await?;
        BotIdentity::from_auth_test(&response)
    }

    async fn call(&self, method: &str, body: &Value) -> Result<Value, DeliveryError> {
        let url = format!("{}/{}", self.api_url, method);
        debug!(method, "Calling Slack API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(method, status = status.as_u16(), "Slack API returned HTTP error");
            return Err(DeliveryError::Rejected {
                method: method.into(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        parse_api_response(method, &text)
    }
}

#[async_trait]
impl ChatSurface for SlackSurface {
    async fn post(&self, thread: &ThreadKey, payload: &RenderPayload) -> Result<MessageRef, DeliveryError> {
        let mut body = json!({
            "channel": thread.channel,
            "thread_ts": thread.thread_ts,
            "text": payload.text,
        });
        if !payload.blocks.is_empty() {
            body["blocks"] = Value::Array(render_blocks(&payload.blocks));
        }

        let response = self.call("chat.postMessage", &body).await?;
        let ts = string_field(&response, "ts").ok_or_else(|| {
            DeliveryError::InvalidResponse("chat.postMessage: missing ts".into())
        })?;

        Ok(MessageRef {
            channel: string_field(&response, "channel").unwrap_or_else(|| thread.channel.clone()),
            ts,
        })
    }

    async fn update(&self, message: &MessageRef, payload: &RenderPayload) -> Result<(), DeliveryError> {
        // An explicit empty list clears blocks left over from the previous content
        let body = json!({
            "channel": message.channel,
            "ts": message.ts,
            "text": payload.text,
            "blocks": render_blocks(&payload.blocks),
        });
        self.call("chat.update", &body).await?;
        Ok(())
    }
}

/// Interpret a Web API response body.
pub fn parse_api_response(method: &str, body: &str) -> Result<Value, DeliveryError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DeliveryError::InvalidResponse(format!("{method}: {e}")))?;

    if value["ok"].as_bool() == Some(true) {
        return Ok(value);
    }

    let reason = value["error"].as_str().unwrap_or("unknown_error").to_string();
    warn!(method, reason = %reason, "Slack API rejected call");
    Err(DeliveryError::Rejected {
        method: method.into(),
        reason,
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}
