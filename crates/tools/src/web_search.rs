//! Web search backed by the DuckDuckGo Instant Answer API.
//!
//! The API needs no key. It returns an abstract for well-known topics plus a
//! list of related topics, which is enough for grounding short answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use threadrelay_core::error::ToolError;
use threadrelay_core::tool::{Capability, ToolResult};
use tracing::debug;

use crate::http;

pub const NAME: &str = "web_search";

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";

pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new() -> Result<Self, ToolError> {
        Ok(Self {
            client: http::client(NAME)?,
            endpoint: DEFAULT_ENDPOINT.into(),
        })
    }
}

#[async_trait]
impl Capability for WebSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Can be used to search the web for information."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default 5)",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let num_results = arguments["num_results"].as_u64().unwrap_or(5).clamp(1, 10) as usize;

        debug!(query, num_results, "Searching the web");
        let request = self.client.get(&self.endpoint).query(&[
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ]);
        let body = http::fetch_text(NAME, request).await?;

        let answer: InstantAnswer = serde_json::from_str(&body)
            .map_err(|e| http::failed(NAME, format!("Unexpected search response: {e}")))?;
        let results = answer.into_results(num_results);

        let output = if results.is_empty() {
            format!("No results found for '{query}'.")
        } else {
            serde_json::to_string_pretty(&results).unwrap_or_default()
        };

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
            data: serde_json::to_value(&results).ok(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a topic or a named group of topics.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl InstantAnswer {
    fn into_results(self, limit: usize) -> Vec<SearchResult> {
        let mut results = Vec::new();
        if !self.abstract_text.is_empty() {
            results.push(SearchResult {
                title: self.heading.clone(),
                url: self.abstract_url.clone(),
                snippet: self.abstract_text.clone(),
            });
        }

        let mut stack: Vec<RelatedTopic> = self.related_topics.into_iter().rev().collect();
        while let Some(topic) = stack.pop() {
            if results.len() >= limit {
                break;
            }
            match topic {
                RelatedTopic::Topic { text, first_url } => {
                    // "Title - snippet" is the usual shape of a topic's text
                    let title = text.split(" - ").next().unwrap_or(&text).to_string();
                    results.push(SearchResult {
                        title,
                        url: first_url,
                        snippet: text,
                    });
                }
                RelatedTopic::Group { topics } => stack.extend(topics.into_iter().rev()),
            }
        }

        results.truncate(limit);
        results
    }
}
