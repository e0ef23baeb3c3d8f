//! `threadrelay doctor`: diagnose configuration and Slack access.

use std::path::Path;
use threadrelay_channels::SlackSurface;
use threadrelay_config::AppConfig;

pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    println!("🩺 threadrelay doctor");
    println!("=====================\n");

    let mut issues = 0;

    if !config_path.exists() {
        println!("  ⚠️  No config file at {}; defaults apply (`threadrelay init`)", config_path.display());
    }

    let config = match AppConfig::load_with_env(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue found.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ LLM API key configured ({})", config.api_url);
    } else {
        println!("  ❌ No LLM API key; set OPENAI_API_KEY or api_key");
        issues += 1;
    }

    match SlackSurface::from_config(&config.slack) {
        Ok(Some(slack)) => match slack.auth_test().await {
            Ok(identity) => println!(
                "  ✅ Slack token valid, bot user {} (bot id {})",
                identity.user_id,
                identity.bot_id.as_deref().unwrap_or("none")
            ),
            Err(e) => {
                println!("  ❌ Slack auth.test failed: {e}");
                issues += 1;
            }
        },
        Ok(None) => {
            println!("  ❌ No Slack bot token; set SLACK_BOT_TOKEN or slack.bot_token");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Slack client unavailable: {e}");
            issues += 1;
        }
    }

    println!("  ✅ Memory backend: {}", config.memory.backend);

    match threadrelay_tools::default_catalog(&config.tools) {
        Ok(catalog) => println!("  ✅ Tools: {}", catalog.names().join(", ")),
        Err(e) => {
            println!("  ❌ Tool catalog: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
