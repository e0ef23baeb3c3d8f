//! Agent and ruleset collaborators.
//!
//! The agent's own reasoning loop lives behind [`Agent`]; the relay only
//! hands it a request and a sink for its lifecycle events.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::AgentError;
use crate::event::EventSink;
use crate::memory::MemoryHandle;
use crate::tool::ToolDescriptor;

/// Everything one agent run needs.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// The user's text (or a meta-prompt)
    pub input: String,

    /// Platform id of whoever asked, used to tag the remembered turn
    pub sender: Option<String>,

    /// Behaviour rules appended to the system prompt
    pub rules: Vec<String>,

    pub memory: MemoryHandle,

    /// Tools the run may call, already selected
    pub tools: Vec<ToolDescriptor>,

    /// Emit the answer incrementally as chunk events
    pub stream: bool,
}

impl AgentRequest {
    pub fn new(input: impl Into<String>, memory: MemoryHandle) -> Self {
        Self {
            input: input.into(),
            sender: None,
            rules: Vec::new(),
            memory,
            tools: Vec::new(),
            stream: false,
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// The final result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutput {
    pub text: String,
}

/// An LLM agent.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run to completion, delivering lifecycle events to `sink` in order.
    async fn run(
        &self,
        request: AgentRequest,
        sink: &mut dyn EventSink,
    ) -> std::result::Result<AgentOutput, AgentError>;
}

/// A named group of behaviour rules plus free-form flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ruleset {
    pub name: String,

    #[serde(default)]
    pub rules: Vec<String>,

    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl Ruleset {
    /// Whether a boolean-like flag is set. Absent means false.
    pub fn flag(&self, key: &str) -> bool {
        self.meta.get(key).is_some_and(is_truthy)
    }
}

/// Boolean-like reading of a JSON value: `true`, non-zero numbers and
/// non-empty strings, arrays and objects are set.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

/// The flags the relay reads from a response's rulesets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RulesetFlags {
    /// Stream the answer into one continuously updated message
    pub stream: bool,
    /// Let the agent pick its tools per request
    pub enable_toolbox: bool,
}

impl RulesetFlags {
    /// A flag is on if any ruleset sets it.
    pub fn from_rulesets(rulesets: &[Ruleset]) -> Self {
        Self {
            stream: rulesets.iter().any(|r| r.flag("stream")),
            enable_toolbox: rulesets.iter().any(|r| r.flag("enable_toolbox")),
        }
    }
}

/// Who is asking, for rules engines that scope rulesets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesetQuery {
    pub user_id: String,
    pub channel_id: String,
    pub team_id: Option<String>,
    pub app_id: Option<String>,
}

/// The external rules engine.
#[async_trait]
pub trait RulesetSource: Send + Sync {
    async fn resolve(&self, query: &RulesetQuery) -> std::result::Result<Vec<Ruleset>, AgentError>;
}

/// Rulesets fixed at startup (from configuration).
#[derive(Debug, Clone, Default)]
pub struct StaticRulesets {
    rulesets: Vec<Ruleset>,
}

impl StaticRulesets {
    pub fn new(rulesets: Vec<Ruleset>) -> Self {
        Self { rulesets }
    }
}

#[async_trait]
impl RulesetSource for StaticRulesets {
    async fn resolve(&self, _query: &RulesetQuery) -> std::result::Result<Vec<Ruleset>, AgentError> {
        Ok(self.rulesets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ruleset(meta: serde_json::Value) -> Ruleset {
        Ruleset {
            name: "test".into(),
            rules: vec![],
            meta: meta.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn truthiness_follows_boolean_like_values() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!([])));
    }

    #[test]
    fn absent_flags_default_to_false() {
        let flags = RulesetFlags::from_rulesets(&[ruleset(json!({}))]);
        assert_eq!(flags, RulesetFlags::default());
        assert_eq!(RulesetFlags::from_rulesets(&[]), RulesetFlags::default());
    }

    #[test]
    fn any_ruleset_turns_a_flag_on() {
        let flags = RulesetFlags::from_rulesets(&[
            ruleset(json!({"stream": false})),
            ruleset(json!({"stream": 1, "enable_toolbox": false})),
        ]);
        assert!(flags.stream);
        assert!(!flags.enable_toolbox);
    }

    #[tokio::test]
    async fn static_rulesets_ignore_query() {
        let source = StaticRulesets::new(vec![ruleset(json!({"enable_toolbox": true}))]);
        let resolved = source.resolve(&RulesetQuery::default()).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].flag("enable_toolbox"));
    }

    #[test]
    fn ruleset_parses_from_json() {
        let r: Ruleset = serde_json::from_value(json!({"name": "tone", "rules": ["Be brief."]})).unwrap();
        assert_eq!(r.rules, vec!["Be brief."]);
        assert!(r.meta.is_empty());
    }
}
