//! Tool selection.
//!
//! In static mode every catalog tool is handed to the agent. In dynamic mode
//! the agent itself is asked, through a constrained meta-prompt, which tools
//! the request needs; its free-text answer is parsed defensively against the
//! catalog.

use std::collections::HashSet;
use std::sync::Arc;
use threadrelay_core::error::{AgentError, SelectionError};
use threadrelay_core::event::NullSink;
use threadrelay_core::memory::MemoryHandle;
use threadrelay_core::tool::{Catalog, ToolDescriptor};
use threadrelay_core::{Agent, AgentRequest};
use tracing::{info, warn};

/// Rules constraining the selection answer.
pub const SELECTION_RULES: [&str; 4] = [
    "The tool name is the key in the tools dictionary, and the description is the value.",
    "Only respond with a comma-separated list of tool names.",
    "Do not include any other information.",
    "If no tools are needed, respond with 'None'.",
];

/// Picks the tools for one request.
pub struct ToolSelector {
    agent: Arc<dyn Agent>,
}

impl ToolSelector {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self { agent }
    }

    /// Select tools for `message`.
    ///
    /// The selection run uses scratch memory and a discarding sink, so it
    /// leaves no trace in the thread or its history.
    pub async fn select(
        &self,
        message: &str,
        catalog: &Catalog,
        dynamic: bool,
    ) -> Result<Vec<ToolDescriptor>, AgentError> {
        if !dynamic {
            return Ok(catalog.iter().cloned().collect());
        }

        let request = AgentRequest::new(selection_prompt(message, catalog), MemoryHandle::scratch())
            .with_rules(SELECTION_RULES.iter().map(|r| r.to_string()).collect());
        let output = self.agent.run(request, &mut NullSink).await?;

        let selection = parse_selection(&output.text, catalog);
        for rejected in &selection.rejected {
            warn!(error = %rejected, "Ignoring tool named by the agent");
        }
        info!(tools = ?selection.names(), "Tools needed");
        Ok(selection.tools)
    }
}

/// The meta-prompt: the request plus the catalog as a name → description map.
pub fn selection_prompt(message: &str, catalog: &Catalog) -> String {
    let tools = serde_json::Value::Object(catalog.descriptions());
    format!(
        "Given the input, what tools are needed to give an accurate response? Input: '{message}' Tools: {tools}"
    )
}

/// Parsed selection answer.
#[derive(Debug, Default)]
pub struct Selection {
    /// Known tools, in the order the agent named them, without duplicates
    pub tools: Vec<ToolDescriptor>,
    /// Tokens that named no catalog tool
    pub rejected: Vec<SelectionError>,
}

impl Selection {
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Parse a comma-separated tool list (or `None`) against the catalog.
pub fn parse_selection(answer: &str, catalog: &Catalog) -> Selection {
    let mut selection = Selection::default();
    let answer = clean_token(answer);
    if answer.is_empty() || answer.eq_ignore_ascii_case("none") {
        return selection;
    }

    let mut seen = HashSet::new();
    for token in answer.split(',').map(clean_token) {
        if token.is_empty() || token.eq_ignore_ascii_case("none") {
            continue;
        }
        let found = catalog.get(token).or_else(|| {
            catalog
                .iter()
                .find(|d| d.name.eq_ignore_ascii_case(token))
        });
        match found {
            Some(descriptor) => {
                if seen.insert(descriptor.name.clone()) {
                    selection.tools.push(descriptor.clone());
                }
            }
            None => selection.rejected.push(SelectionError::UnknownTool(token.to_string())),
        }
    }
    selection
}

/// Trim whitespace, wrapping quotes/backticks and a trailing period.
fn clean_token(token: &str) -> &str {
    token
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim()
}
