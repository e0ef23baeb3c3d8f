//! Built-in capabilities for threadrelay.
//!
//! Capabilities give the agent a way to look things up while answering:
//! scrape a page, search the web, read the clock, consult LinkedIn.
//! [`default_catalog`] assembles the ones enabled in configuration.

pub mod date_time;
mod http;
pub mod linkedin_client;
pub mod web_scraper;
pub mod web_search;

use std::sync::Arc;
use threadrelay_config::ToolsConfig;
use threadrelay_core::error::ToolError;
use threadrelay_core::tool::{Capability, Catalog, ToolDescriptor};
use tracing::{info, warn};

pub use date_time::DateTimeTool;
pub use linkedin_client::LinkedinClientTool;
pub use web_scraper::WebScraperTool;
pub use web_search::WebSearchTool;

/// Build the catalog of enabled tools, in the order they are listed.
///
/// Unknown names are skipped with a warning. `linkedin_client` needs a
/// Proxycurl API key and is left out without one.
pub fn default_catalog(config: &ToolsConfig) -> Result<Catalog, ToolError> {
    let mut catalog = Catalog::new();

    for name in &config.enabled {
        let capability: Arc<dyn Capability> = match name.as_str() {
            web_scraper::NAME => Arc::new(WebScraperTool::new()?),
            web_search::NAME => Arc::new(WebSearchTool::new()?),
            date_time::NAME => Arc::new(DateTimeTool),
            linkedin_client::NAME => match &config.proxycurl_api_key {
                Some(key) => Arc::new(LinkedinClientTool::new(key.clone())?),
                None => {
                    info!("No Proxycurl API key configured, linkedin_client disabled");
                    continue;
                }
            },
            other => {
                warn!(tool = %other, "Unknown tool in configuration, skipping");
                continue;
            }
        };
        catalog.insert(ToolDescriptor::from_capability(capability));
    }

    Ok(catalog)
}
