//! Capability trait and the tool catalog.
//!
//! A capability is something the agent can invoke (scrape a page, search the
//! web, look up a profile). The catalog maps a stable tool name to a
//! [`ToolDescriptor`] that carries the name, the description shown to the
//! model during tool selection, and a shared handle to the capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// The core Capability trait.
///
/// Each built-in tool (web_scraper, web_search, date_time, linkedin_client)
/// implements this trait and is exposed to the agent through the [`Catalog`].
#[async_trait]
pub trait Capability: Send + Sync {
    /// The unique name of this capability (e.g., "web_search").
    fn name(&self) -> &str;

    /// A description of what this capability does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this capability's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invoke the capability with the given arguments.
    async fn invoke(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;
}

/// A catalog entry: the name the model uses, what it is for, and the handle
/// the agent invokes.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub capability: Arc<dyn Capability>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        capability: Arc<dyn Capability>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capability,
        }
    }

    /// Describe a capability by its own name and description.
    pub fn from_capability(capability: Arc<dyn Capability>) -> Self {
        Self {
            name: capability.name().to_string(),
            description: capability.description().to_string(),
            capability,
        }
    }

    /// Convert into a ToolDefinition for sending to the LLM.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.capability.parameters_schema(),
        }
    }

    /// Invoke the underlying capability, stamping the call id on the result.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let mut result = self.capability.invoke(call.arguments.clone()).await?;
        result.call_id = call.id.clone();
        Ok(result)
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ToolDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.capability, &other.capability)
    }
}

/// The static mapping of tool name to descriptor available to an agent run.
///
/// Keys are unique. Iteration follows insertion order, which is the
/// "catalog order" used when every tool is handed to the agent.
#[derive(Clone, Default)]
pub struct Catalog {
    entries: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Replaces an existing entry of the same name in place.
    pub fn insert(&mut self, descriptor: ToolDescriptor) {
        match self.index.get(&descriptor.name) {
            Some(&pos) => self.entries[pos] = descriptor,
            None => {
                self.index.insert(descriptor.name.clone(), self.entries.len());
                self.entries.push(descriptor);
            }
        }
    }

    /// Builder-style [`Catalog::insert`].
    pub fn with(mut self, descriptor: ToolDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&pos| &self.entries[pos])
    }

    /// All descriptors in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.iter()
    }

    /// Tool names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.name.as_str()).collect()
    }

    /// Name → description map, as shown to the model during tool selection.
    pub fn descriptions(&self) -> serde_json::Map<String, serde_json::Value> {
        self.entries
            .iter()
            .map(|d| (d.name.clone(), serde_json::Value::String(d.description.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
