//! LinkedIn lookups through the Proxycurl API.
//!
//! Resolves a person or company profile URL into a compact JSON summary.
//! Requires a Proxycurl API key.

use async_trait::async_trait;
use threadrelay_core::error::ToolError;
use threadrelay_core::tool::{Capability, ToolResult};
use tracing::debug;

use crate::http;

pub const NAME: &str = "linkedin_client";

const DEFAULT_BASE_URL: &str = "https://nubela.co/proxycurl/api";

/// How many experience/education entries to keep.
const MAX_LIST_ENTRIES: usize = 5;

pub struct LinkedinClientTool {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LinkedinClientTool {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ToolError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ToolError::NotConfigured("Proxycurl API key is empty".into()));
        }
        Ok(Self {
            client: http::client(NAME)?,
            base_url: DEFAULT_BASE_URL.into(),
            api_key,
        })
    }

    fn endpoint(&self, kind: ProfileKind) -> String {
        match kind {
            ProfileKind::Person => format!("{}/v2/linkedin", self.base_url),
            ProfileKind::Company => format!("{}/linkedin/company", self.base_url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileKind {
    Person,
    Company,
}

impl ProfileKind {
    /// Company pages live under `/company/`, everything else is a person.
    fn from_url(url: &str) -> Self {
        if url.contains("linkedin.com/company/") {
            Self::Company
        } else {
            Self::Person
        }
    }
}

#[async_trait]
impl Capability for LinkedinClientTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Can be used to consult Linkedin for information."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "profile_url": {
                    "type": "string",
                    "description": "LinkedIn URL of a person (linkedin.com/in/...) or company (linkedin.com/company/...)"
                }
            },
            "required": ["profile_url"]
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let profile_url = arguments["profile_url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'profile_url' argument".into()))?;

        if !profile_url.contains("linkedin.com/") {
            return Err(ToolError::InvalidArguments(format!(
                "Not a LinkedIn URL: {profile_url}"
            )));
        }

        let kind = ProfileKind::from_url(profile_url);
        debug!(profile_url, ?kind, "Looking up LinkedIn profile");

        let request = self
            .client
            .get(self.endpoint(kind))
            .bearer_auth(&self.api_key)
            .query(&[("url", profile_url)]);
        let body = http::fetch_text(NAME, request).await?;

        let profile: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| http::failed(NAME, format!("Unexpected Proxycurl response: {e}")))?;
        let summary = summarize_profile(&profile);

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: serde_json::to_string_pretty(&summary).unwrap_or_default(),
            data: Some(summary),
        })
    }
}

/// Keep the fields that matter for a short briefing and drop empty ones.
pub fn summarize_profile(profile: &serde_json::Value) -> serde_json::Value {
    const SCALARS: &[&str] = &[
        "full_name",
        "name",
        "headline",
        "occupation",
        "summary",
        "description",
        "city",
        "country_full_name",
        "industry",
        "website",
        "company_size_on_linkedin",
        "follower_count",
    ];
    const LISTS: &[&str] = &["experiences", "education"];

    let mut summary = serde_json::Map::new();
    for key in SCALARS {
        if let Some(value) = profile.get(*key).filter(|v| !is_empty(v)) {
            summary.insert((*key).to_string(), value.clone());
        }
    }
    for key in LISTS {
        if let Some(entries) = profile.get(*key).and_then(|v| v.as_array()) {
            let kept: Vec<serde_json::Value> = entries
                .iter()
                .take(MAX_LIST_ENTRIES)
                .map(strip_empty)
                .collect();
            if !kept.is_empty() {
                summary.insert((*key).to_string(), serde_json::Value::Array(kept));
            }
        }
    }
    serde_json::Value::Object(summary)
}

fn strip_empty(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .filter(|(_, v)| !is_empty(v))
                .map(|(k, v)| (k.clone(), strip_empty(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_key_is_not_configured() {
        assert!(matches!(
            LinkedinClientTool::new("  "),
            Err(ToolError::NotConfigured(_))
        ));
    }

    #[test]
    fn company_urls_use_company_endpoint() {
        let tool = LinkedinClientTool::new("pk").unwrap();
        assert_eq!(
            tool.endpoint(ProfileKind::from_url("https://www.linkedin.com/company/acme")),
            "https://nubela.co/proxycurl/api/linkedin/company"
        );
        assert_eq!(
            ProfileKind::from_url("https://www.linkedin.com/in/jane-doe"),
            ProfileKind::Person
        );
    }

    #[test]
    fn summary_drops_empty_fields_and_caps_lists() {
        let profile = json!({
            "full_name": "Jane Doe",
            "headline": "CTO at Acme",
            "summary": null,
            "city": "",
            "public_identifier": "jane-doe",
            "experiences": (0..8).map(|i| json!({"company": format!("Co{i}"), "title": "Engineer", "logo_url": null})).collect::<Vec<_>>(),
            "education": []
        });

        let summary = summarize_profile(&profile);
        assert_eq!(summary["full_name"], "Jane Doe");
        assert!(summary.get("summary").is_none());
        assert!(summary.get("city").is_none());
        assert!(summary.get("public_identifier").is_none());
        assert!(summary.get("education").is_none());

        let experiences = summary["experiences"].as_array().unwrap();
        assert_eq!(experiences.len(), MAX_LIST_ENTRIES);
        assert!(experiences[0].get("logo_url").is_none());
    }

    #[tokio::test]
    async fn rejects_non_linkedin_urls() {
        let tool = LinkedinClientTool::new("pk").unwrap();
        let result = tool.invoke(json!({"profile_url": "https://example.com/jane"})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
