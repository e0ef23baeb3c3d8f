//! # threadrelay relay
//!
//! The pipeline between an agent's event stream and a chat thread:
//!
//! 1. **Gate** ([`ThreadConversationGate`]): ignore, remember or answer
//! 2. **Select tools** ([`ToolSelector`]): whole catalog, or the subset the
//!    agent asks for
//! 3. **Run** the agent with a sink:
//!    - [`ProgressSink`] posts each classified lifecycle event as a reply
//!    - [`BatchedStreamDriver`] streams chunks into one updated message
//! 4. **Deliver** the final answer as segmented markdown replies
//!
//! [`ResponseOrchestrator`] ties the steps together per inbound message.

pub mod classifier;
pub mod gate;
pub mod orchestrator;
pub mod segment;
pub mod selector;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::{ProgressSink, classify};
pub use gate::{GateDecision, ThreadConversationGate};
pub use orchestrator::{HandleOutcome, RelayContext, ResponseOrchestrator};
pub use segment::segment_markdown;
pub use selector::{Selection, ToolSelector, parse_selection};
pub use stream::{BatchedStreamDriver, DeliveryBatch};
