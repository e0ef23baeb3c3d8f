//! Error types for the threadrelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// Failure of one inbound event at the gateway edge: either the event was
/// malformed or its outcome could not be delivered to the chat.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A malformed inbound chat event. Fatal for that event: it is logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Inbound event is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Unsupported inbound event type: {0}")]
    UnsupportedEvent(String),
}

/// A token in the tool-selection answer that could not be resolved.
///
/// Recoverable: the token is skipped and the rest of the selection stands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Unknown tool in selection: '{0}'")]
    UnknownTool(String),
}

/// Failure raised while the agent was running.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Provider failure: {0}")]
    Provider(#[from] ProviderError),

    #[error("Event delivery failed mid-run: {0}")]
    Sink(#[from] DeliveryError),

    #[error("Conversation memory failure: {0}")]
    Memory(#[from] MemoryError),

    #[error("Ruleset resolution failed: {0}")]
    Rulesets(String),

    #[error("Agent run failed: {0}")]
    Run(String),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// A chat surface post/update that did not go through.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Chat API call {method} rejected: {reason}")]
    Rejected { method: String, reason: String },

    #[error("Chat API network failure: {0}")]
    Network(String),

    #[error("Chat API returned an unreadable response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = AgentError::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn delivery_error_displays_method() {
        let err = Error::Delivery(DeliveryError::Rejected {
            method: "chat.update".into(),
            reason: "message_not_found".into(),
        });
        assert!(err.to_string().contains("chat.update"));
        assert!(err.to_string().contains("message_not_found"));
    }

    #[test]
    fn gate_error_names_field() {
        let err = GateError::MissingField("ts");
        assert_eq!(err.to_string(), "Inbound event is missing required field 'ts'");

        let err: Error = err.into();
        assert!(matches!(err, Error::Gate(_)));
    }

    #[test]
    fn sink_failure_wraps_into_agent_error() {
        let err: AgentError = DeliveryError::Network("connection reset".into()).into();
        assert!(matches!(err, AgentError::Sink(_)));
    }
}
