//! `threadrelay serve`: wire the relay together and start the gateway.

use anyhow::{Context, bail};
use std::path::Path;
use std::sync::Arc;
use threadrelay_agent::LlmAgent;
use threadrelay_channels::SlackSurface;
use threadrelay_config::AppConfig;
use threadrelay_core::StaticRulesets;
use threadrelay_providers::OpenAiCompatProvider;
use threadrelay_relay::{RelayContext, ResponseOrchestrator, ThreadConversationGate};
use tracing::info;

pub async fn run(config_path: &Path, port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load_with_env(config_path).context("Failed to load config")?;
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let Some(slack) = SlackSurface::from_config(&config.slack)? else {
        bail!("No Slack bot token configured; set SLACK_BOT_TOKEN or slack.bot_token");
    };
    let (bot_user_id, bot_id) = match (&config.slack.bot_user_id, &config.slack.bot_id) {
        (Some(user_id), Some(bot_id)) => (user_id.clone(), Some(bot_id.clone())),
        (user_id, bot_id) => {
            let identity = slack
                .auth_test()
                .await
                .context("Could not resolve the bot identity via auth.test")?;
            (
                user_id.clone().unwrap_or(identity.user_id),
                bot_id.clone().or(identity.bot_id),
            )
        }
    };

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config)?);
    let agent = LlmAgent::from_config(provider, &config).with_speaker_id(&bot_user_id);
    let catalog = threadrelay_tools::default_catalog(&config.tools)?;

    info!(
        bot = %bot_user_id,
        bot_id = ?bot_id,
        memory = %config.memory.backend,
        model = %config.default_model,
        tools = ?catalog.names(),
        rulesets = config.rulesets.len(),
        "Relay ready"
    );

    let context = RelayContext {
        surface: Arc::new(slack),
        agent: Arc::new(agent),
        memory: threadrelay_memory::from_config(&config.memory),
        rulesets: Arc::new(StaticRulesets::new(config.rulesets.clone())),
        catalog,
        gate: ThreadConversationGate::from_config(&bot_user_id, &config.relay).with_bot_id(bot_id),
        settings: config.relay.clone(),
    };
    let orchestrator = Arc::new(ResponseOrchestrator::new(Arc::new(context)));

    println!("🧵 threadrelay");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Events:    POST /slack/events");

    threadrelay_gateway::start(&config.gateway, orchestrator).await?;
    Ok(())
}
