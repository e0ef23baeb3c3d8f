//! Slack plumbing for threadrelay.
//!
//! - **slack**: the [`ChatSurface`](threadrelay_core::ChatSurface) over the
//!   Slack Web API (`chat.postMessage`, `chat.update`, `auth.test`)
//! - **blocks**: semantic blocks rendered as Block Kit JSON
//! - **events**: Events API envelopes turned into validated inbound messages

pub mod blocks;
pub mod events;
pub mod slack;

pub use blocks::render_blocks;
pub use events::{SlackEnvelope, parse_inbound};
pub use slack::{BotIdentity, SlackSurface};
