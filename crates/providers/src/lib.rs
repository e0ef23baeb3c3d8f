//! LLM provider implementations for threadrelay.
//!
//! Providers implement the `threadrelay_core::Provider` trait. The bundled
//! agent talks to any OpenAI-compatible `/chat/completions` endpoint.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
