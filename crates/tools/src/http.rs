//! Shared HTTP plumbing for network-backed capabilities.

use std::time::Duration;
use threadrelay_core::error::ToolError;

const USER_AGENT: &str = concat!("threadrelay/", env!("CARGO_PKG_VERSION"));

pub(crate) fn client(tool_name: &str) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| failed(tool_name, format!("HTTP client: {e}")))
}

pub(crate) fn failed(tool_name: &str, reason: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: reason.into(),
    }
}

/// Send a request and return the body of a successful response.
pub(crate) async fn fetch_text(
    tool_name: &str,
    request: reqwest::RequestBuilder,
) -> Result<String, ToolError> {
    let response = request
        .send()
        .await
        .map_err(|e| failed(tool_name, e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| failed(tool_name, e.to_string()))?;

    if !status.is_success() {
        return Err(failed(tool_name, format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200))));
    }
    Ok(body)
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé…");
        assert_eq!(truncate("short", 10), "short");
    }
}
