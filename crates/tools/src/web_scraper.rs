//! Web scraper: fetches a page and reduces it to readable text.

use async_trait::async_trait;
use threadrelay_core::error::ToolError;
use threadrelay_core::tool::{Capability, ToolResult};
use tracing::debug;

use crate::http;

pub const NAME: &str = "web_scraper";

/// Upper bound on returned text, so one page cannot flood the context window.
const DEFAULT_MAX_CHARS: usize = 8_000;

pub struct WebScraperTool {
    client: reqwest::Client,
    max_chars: usize,
}

impl WebScraperTool {
    pub fn new() -> Result<Self, ToolError> {
        Ok(Self {
            client: http::client(NAME)?,
            max_chars: DEFAULT_MAX_CHARS,
        })
    }
}

#[async_trait]
impl Capability for WebScraperTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Can be used to scrape information from webpages."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The page to fetch (http or https)"
                }
            },
            "required": ["url"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let url = arguments["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "URL must start with http:// or https://".into(),
            ));
        }

        debug!(url, "Scraping page");
        let html = http::fetch_text(NAME, self.client.get(url)).await?;
        let text = http::truncate(&html_to_text(&html), self.max_chars);

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: text,
            data: Some(serde_json::json!({ "url": url })),
        })
    }
}

/// Strip markup from an HTML document, keeping visible text.
///
/// Script, style and head contents are dropped, block-level tags become line
/// breaks and runs of whitespace collapse.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let lower = html.to_ascii_lowercase();
    let mut pos = 0;

    while let Some(rel) = html[pos..].find('<') {
        let start = pos + rel;
        out.push_str(&html[pos..start]);

        let Some(rel_end) = html[start..].find('>') else {
            pos = html.len();
            break;
        };
        let end = start + rel_end + 1;
        let tag = tag_name(&lower[start + 1..end - 1]);

        // Skip the whole element for non-visible content
        if matches!(tag, "script" | "style" | "head" | "noscript") && !lower[start + 1..].starts_with('/') {
            let closing = format!("</{tag}");
            pos = match lower[end..].find(&closing) {
                Some(close_rel) => {
                    let close_start = end + close_rel;
                    lower[close_start..]
                        .find('>')
                        .map_or(html.len(), |gt| close_start + gt + 1)
                }
                None => html.len(),
            };
            continue;
        }

        if matches!(tag, "p" | "br" | "div" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
            out.push('\n');
        }
        pos = end;
    }
    if pos < html.len() {
        out.push_str(&html[pos..]);
    }

    let decoded = decode_entities(&out);
    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn tag_name(inner: &str) -> &str {
    inner
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
