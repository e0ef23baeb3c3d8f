//! `threadrelay init`: write a default config file.

use anyhow::Context;
use std::path::Path;
use threadrelay_config::AppConfig;

pub fn run(config_path: &Path, force: bool) -> anyhow::Result<()> {
    if write_default(config_path, force)? {
        println!("✅ Created config at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set SLACK_BOT_TOKEN and OPENAI_API_KEY (or add them to the file)");
        println!("   2. Point your Slack app's event subscription at /slack/events");
        println!("   3. Run: threadrelay serve\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.");
    }
    Ok(())
}

/// Returns whether the file was written.
fn write_default(config_path: &Path, force: bool) -> anyhow::Result<bool> {
    if config_path.exists() && !force {
        return Ok(false);
    }
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    std::fs::write(config_path, AppConfig::default_toml())
        .with_context(|| format!("writing {}", config_path.display()))?;
    Ok(true)
}
