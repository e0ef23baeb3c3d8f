//! Block Kit rendering.

use serde_json::{Value, json};
use threadrelay_core::render::Block;

/// Render semantic blocks as Slack Block Kit JSON, in order.
pub fn render_blocks(blocks: &[Block]) -> Vec<Value> {
    blocks.iter().map(render_block).collect()
}

fn render_block(block: &Block) -> Value {
    match block {
        Block::EmojiLine { icon, text } => section(&format!("{icon} {text}")),
        Block::Thought { text } => context(&format!("_{text}_")),
        Block::Action { text } => context(&format!(":hammer_and_wrench: {text}")),
        Block::Markdown { text } => section(text),
    }
}

fn section(text: &str) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text }
    })
}

fn context(text: &str) -> Value {
    json!({
        "type": "context",
        "elements": [{ "type": "mrkdwn", "text": text }]
    })
}
