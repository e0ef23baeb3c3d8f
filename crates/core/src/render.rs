//! Render payloads, the unit handed to the chat surface.
//!
//! This module only produces the semantic block list. How a block looks on
//! the wire (Slack Block Kit, plain text, ...) is the chat surface's concern.

use serde::{Deserialize, Serialize};

/// A semantic UI block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// A single line led by an emoji shortcode (e.g. `:envelope:`).
    EmojiLine { icon: String, text: String },
    /// The agent's reasoning for the current step.
    Thought { text: String },
    /// A pending tool invocation.
    Action { text: String },
    /// A chunk of markdown (final answers, error details).
    Markdown { text: String },
}

impl Block {
    pub fn emoji(icon: impl Into<String>, text: impl Into<String>) -> Self {
        Self::EmojiLine {
            icon: icon.into(),
            text: text.into(),
        }
    }

    pub fn thought(text: impl Into<String>) -> Self {
        Self::Thought { text: text.into() }
    }

    pub fn action(text: impl Into<String>) -> Self {
        Self::Action { text: text.into() }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self::Markdown { text: text.into() }
    }

    /// The human-readable text of this block.
    pub fn text(&self) -> &str {
        match self {
            Self::EmojiLine { text, .. }
            | Self::Thought { text }
            | Self::Action { text }
            | Self::Markdown { text } => text,
        }
    }
}

/// Plain fallback text plus an ordered block list.
///
/// `text` is never empty while `blocks` is non-empty: clients that cannot
/// render blocks show `text` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

impl RenderPayload {
    /// A text-only payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: Vec::new(),
        }
    }

    /// A block payload. An empty `text` falls back to the first block's text.
    pub fn with_blocks(text: impl Into<String>, blocks: Vec<Block>) -> Self {
        let mut text = text.into();
        if text.is_empty() {
            text = blocks
                .iter()
                .map(Block::text)
                .find(|t| !t.is_empty())
                .unwrap_or("...")
                .to_string();
        }
        Self { text, blocks }
    }

    /// Posted immediately when a response starts.
    pub fn thinking() -> Self {
        Self::with_blocks("Thinking...", vec![Block::emoji(":thinking_face:", "Thinking...")])
    }

    /// Replaces the thinking placeholder once a response has been delivered.
    pub fn done() -> Self {
        Self::with_blocks("Done", vec![Block::emoji(":white_check_mark:", "Done")])
    }

    /// Replaces the thinking placeholder when the response failed.
    ///
    /// The detail block never exceeds `max_block_chars`; a longer detail is
    /// cut and ends in an ellipsis.
    pub fn error(detail: &str, max_block_chars: usize) -> Self {
        const FENCES: usize = 6;
        let detail_block = if max_block_chars > FENCES {
            format!("```{}```", clip(detail, max_block_chars - FENCES))
        } else {
            clip(detail, max_block_chars)
        };
        Self::with_blocks(
            format!("Error: {}", clip(detail, max_block_chars)),
            vec![
                Block::emoji(":warning:", "Something went wrong while answering."),
                Block::markdown(detail_block),
            ],
        )
    }
}

/// Cut `text` to at most `max_chars` characters, the last being `…` when
/// anything was dropped.
pub fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let Some(keep) = max_chars.checked_sub(1) else {
        return String::new();
    };
    let mut clipped: String = text.chars().take(keep).collect();
    clipped.push('…');
    clipped
}
