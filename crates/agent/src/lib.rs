//! The agent loop behind threadrelay's answers.
//!
//! [`LlmAgent`] follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Build context** (system prompt + rules + thread history + the request)
//! 2. **Send to LLM** via the configured provider
//! 3. **If tool calls**: execute them through the selected descriptors,
//!    append results, loop back to step 2
//! 4. **If text response**: remember the exchange and return it
//!
//! Every step is reported to the caller's [`EventSink`](threadrelay_core::EventSink)
//! as an [`AgentEvent`](threadrelay_core::AgentEvent).

pub mod loop_runner;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::LlmAgent;
