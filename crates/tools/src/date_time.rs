//! Current date and time, so the agent can reason about "today".

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;
use threadrelay_core::error::ToolError;
use threadrelay_core::tool::{Capability, ToolResult};

pub const NAME: &str = "date_time";

pub struct DateTimeTool;

#[async_trait]
impl Capability for DateTimeTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Can be used to get the current date and time."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "utc_offset_hours": {
                    "type": "number",
                    "description": "Offset from UTC in hours, e.g. -5 or 5.5 (default 0)"
                },
                "format": {
                    "type": "string",
                    "description": "strftime-style format (default RFC 3339)"
                }
            }
        })
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let offset = parse_offset(&arguments["utc_offset_hours"])?;
        let now = Utc::now().with_timezone(&offset);
        let formatted = format_time(&now, arguments["format"].as_str())?;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: formatted,
            data: Some(serde_json::json!({
                "iso": now.to_rfc3339(),
                "unix": now.timestamp(),
                "weekday": now.format("%A").to_string(),
            })),
        })
    }
}

fn parse_offset(value: &serde_json::Value) -> Result<FixedOffset, ToolError> {
    let hours = match value {
        serde_json::Value::Null => 0.0,
        other => other.as_f64().ok_or_else(|| {
            ToolError::InvalidArguments("'utc_offset_hours' must be a number".into())
        })?,
    };
    let seconds = (hours * 3600.0).round() as i32;
    FixedOffset::east_opt(seconds).ok_or_else(|| {
        ToolError::InvalidArguments(format!("UTC offset out of range: {hours}"))
    })
}

fn format_time(time: &DateTime<FixedOffset>, format: Option<&str>) -> Result<String, ToolError> {
    let Some(format) = format else {
        return Ok(time.to_rfc3339());
    };

    // Formatting with a bad specifier would fail inside Display
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ToolError::InvalidArguments(format!("Invalid format: {format}")));
    }

    let mut out = String::new();
    write!(out, "{}", time.format_with_items(StrftimeItems::new(format)))
        .map_err(|_| ToolError::InvalidArguments(format!("Invalid format: {format}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn default_format_is_rfc3339() {
        assert_eq!(format_time(&fixed_time(), None).unwrap(), "2024-03-01T09:30:00+00:00");
    }

    #[test]
    fn custom_format() {
        assert_eq!(format_time(&fixed_time(), Some("%Y-%m-%d %A")).unwrap(), "2024-03-01 Friday");
    }

    #[test]
    fn bad_format_is_rejected() {
        assert!(format_time(&fixed_time(), Some("%Q")).is_err());
    }

    #[test]
    fn offsets_parse_fractional_hours() {
        assert_eq!(parse_offset(&serde_json::json!(5.5)).unwrap().local_minus_utc(), 19_800);
        assert_eq!(parse_offset(&serde_json::Value::Null).unwrap().local_minus_utc(), 0);
        assert!(parse_offset(&serde_json::json!(30)).is_err());
        assert!(parse_offset(&serde_json::json!("five")).is_err());
    }

    #[tokio::test]
    async fn invoke_reports_current_time() {
        let result = DateTimeTool.invoke(serde_json::json!({})).await.unwrap();
        assert!(result.success);
        assert!(result.data.unwrap()["unix"].as_i64().unwrap() > 1_700_000_000);
    }
}
