//! Configuration loading, validation, and management for threadrelay.
//!
//! Loads configuration from `~/.threadrelay/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use threadrelay_core::agent::Ruleset;

/// The root configuration structure.
///
/// Maps directly to `~/.threadrelay/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Slack connection
    #[serde(default)]
    pub slack: SlackConfig,

    /// Event relay behaviour
    #[serde(default)]
    pub relay: RelayConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Thread history storage
    #[serde(default)]
    pub memory: MemoryConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Built-in tools
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Rulesets applied to every response
    #[serde(default)]
    pub rulesets: Vec<Ruleset>,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("slack", &self.slack)
            .field("relay", &self.relay)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("gateway", &self.gateway)
            .field("tools", &self.tools)
            .field("rulesets", &self.rulesets)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token (xoxb-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Slack Web API base URL
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,

    /// The bot's own user id. Resolved via `auth.test` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user_id: Option<String>,

    /// The bot's integration id (`B...`), seen on posts without a user.
    /// Resolved via `auth.test` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

fn default_slack_api_url() -> String {
    "https://slack.com/api".into()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_url: default_slack_api_url(),
            bot_user_id: None,
            bot_id: None,
        }
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("api_url", &self.api_url)
            .field("bot_user_id", &self.bot_user_id)
            .field("bot_id", &self.bot_id)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Streamed chunks per message update
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// Non-mention messages containing this phrase get a response
    #[serde(default = "default_trigger_phrase")]
    pub trigger_phrase: String,

    /// Answer every direct message, not only mentions
    #[serde(default)]
    pub respond_to_direct_messages: bool,

    /// Longest markdown block in a final answer
    #[serde(default = "default_max_block_chars")]
    pub max_block_chars: usize,

    /// Blocks per reply message before the answer spills into another reply
    #[serde(default = "default_max_blocks_per_message")]
    pub max_blocks_per_message: usize,

    /// Mark the thinking placeholder as done once the answer is out
    #[serde(default = "default_true")]
    pub resolve_placeholder: bool,
}

fn default_flush_threshold() -> usize {
    100
}
fn default_trigger_phrase() -> String {
    "New signup by".into()
}
fn default_max_block_chars() -> usize {
    3000
}
fn default_max_blocks_per_message() -> usize {
    50
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            flush_threshold: default_flush_threshold(),
            trigger_phrase: default_trigger_phrase(),
            respond_to_direct_messages: false,
            max_block_chars: default_max_block_chars(),
            max_blocks_per_message: default_max_blocks_per_message(),
            resolve_placeholder: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum tool call iterations per response (safety limit)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Thread turns replayed to the model
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Replaces the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_history_limit() -> usize {
    50
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_limit: default_history_limit(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "in_memory" or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Turns kept per thread; older turns are dropped on append
    #[serde(default = "default_max_turns_per_thread")]
    pub max_turns_per_thread: usize,

    /// Threads kept at once; the least recently active one is evicted
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
}

fn default_memory_backend() -> String {
    "in_memory".into()
}
fn default_max_turns_per_thread() -> usize {
    200
}
fn default_max_threads() -> usize {
    1000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            max_turns_per_thread: default_max_turns_per_thread(),
            max_threads: default_max_threads(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Catalog entries to build, in catalog order
    #[serde(default = "default_enabled_tools")]
    pub enabled: Vec<String>,

    /// Proxycurl key for `linkedin_client`; the tool is skipped without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxycurl_api_key: Option<String>,
}

fn default_enabled_tools() -> Vec<String> {
    vec![
        "web_scraper".into(),
        "web_search".into(),
        "linkedin_client".into(),
        "date_time".into(),
    ]
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_tools(),
            proxycurl_api_key: None,
        }
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("enabled", &self.enabled)
            .field("proxycurl_api_key", &redact(&self.proxycurl_api_key))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.threadrelay/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides:
    /// - `THREADRELAY_API_KEY` / `OPENAI_API_KEY` (when no key is configured)
    /// - `THREADRELAY_MODEL`
    /// - `SLACK_BOT_TOKEN`
    /// - `PROXYCURL_API_KEY`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("THREADRELAY_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("THREADRELAY_MODEL") {
            config.default_model = model;
        }

        if let Ok(token) = std::env::var("SLACK_BOT_TOKEN") {
            config.slack.bot_token = Some(token);
        }

        if config.tools.proxycurl_api_key.is_none() {
            config.tools.proxycurl_api_key = std::env::var("PROXYCURL_API_KEY").ok();
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".threadrelay")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.relay.flush_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "relay.flush_threshold must be at least 1".into(),
            ));
        }

        if self.relay.max_block_chars == 0 {
            return Err(ConfigError::ValidationError(
                "relay.max_block_chars must be at least 1".into(),
            ));
        }

        // Slack rejects messages with more than 50 blocks.
        if self.relay.max_blocks_per_message == 0 || self.relay.max_blocks_per_message > 50 {
            return Err(ConfigError::ValidationError(
                "relay.max_blocks_per_message must be between 1 and 50".into(),
            ));
        }

        if !matches!(self.memory.backend.as_str(), "in_memory" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "memory.backend must be \"in_memory\" or \"none\", got \"{}\"",
                self.memory.backend
            )));
        }

        if self.memory.max_turns_per_thread < self.agent.history_limit {
            return Err(ConfigError::ValidationError(
                "memory.max_turns_per_thread must be at least agent.history_limit".into(),
            ));
        }

        if self.memory.max_threads == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_threads must be at least 1".into(),
            ));
        }

        if self.relay.trigger_phrase.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relay.trigger_phrase must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            slack: SlackConfig::default(),
            relay: RelayConfig::default(),
            agent: AgentSettings::default(),
            memory: MemoryConfig::default(),
            gateway: GatewayConfig::default(),
            tools: ToolsConfig::default(),
            rulesets: vec![],
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.relay.flush_threshold, 100);
        assert_eq!(config.relay.trigger_phrase, "New signup by");
        assert_eq!(config.gateway.port, 3000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.relay.max_block_chars, config.relay.max_block_chars);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_flush_threshold_rejected() {
        let mut config = AppConfig::default();
        config.relay.flush_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn too_many_blocks_per_message_rejected() {
        let mut config = AppConfig::default();
        config.relay.max_blocks_per_message = 51;
        assert!(config.validate().is_err());
    }

    #[test]
    fn memory_section_parses_and_validates() {
        let config: AppConfig = toml::from_str(
            r#"
[memory]
backend = "none"
max_threads = 10
"#,
        )
        .unwrap();
        assert_eq!(config.memory.backend, "none");
        assert_eq!(config.memory.max_threads, 10);
        assert_eq!(config.memory.max_turns_per_thread, 200);
        assert!(config.validate().is_ok());

        let mut unknown = AppConfig::default();
        unknown.memory.backend = "sqlite".into();
        assert!(unknown.validate().is_err());

        let mut too_small = AppConfig::default();
        too_small.memory.max_turns_per_thread = too_small.agent.history_limit - 1;
        assert!(too_small.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
    }

    #[test]
    fn load_from_file_parses_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4o"

[relay]
flush_threshold = 20
respond_to_direct_messages = true

[slack]
bot_user_id = "UBOT"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.relay.flush_threshold, 20);
        assert!(config.relay.respond_to_direct_messages);
        assert_eq!(config.relay.trigger_phrase, "New signup by");
        assert_eq!(config.slack.bot_user_id.as_deref(), Some("UBOT"));
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "relay = 5").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn ruleset_config_parsing() {
        let toml_str = r#"
[[rulesets]]
name = "streaming"
rules = ["Answer in short paragraphs."]
[rulesets.meta]
stream = true

[[rulesets]]
name = "toolbox"
[rulesets.meta]
enable_toolbox = "yes"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rulesets.len(), 2);
        assert_eq!(config.rulesets[0].rules, vec!["Answer in short paragraphs."]);
        assert!(config.rulesets[0].flag("stream"));
        assert!(config.rulesets[1].flag("enable_toolbox"));
        assert!(!config.rulesets[1].flag("stream"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        config.slack.bot_token = Some("xoxb-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("xoxb-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("New signup by"));
    }
}
