//! Inbound prompt request, its transport rules, and normalization.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationError};

use super::timezone::resolve_timezone;

pub const MIN_PROMPT_CHARS: usize = 10;
pub const MAX_PROMPT_CHARS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}

/// Per-channel configuration value. Only scalars are accepted; each has a canonical text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelConfigValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for ChannelConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelConfigValue::Null => f.write_str("null"),
            ChannelConfigValue::Bool(b) => write!(f, "{}", b),
            ChannelConfigValue::Number(n) => write!(f, "{}", n),
            ChannelConfigValue::Text(s) => f.write_str(s),
        }
    }
}

/// Body of `POST /api/v1/validate-prompt`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    #[validate(
        custom(function = "not_blank"),
        length(min = 10, max = 1000, message = "Prompt must be between 10 and 1000 characters")
    )]
    pub prompt: String,

    #[validate(email(message = "Email must be valid"))]
    pub email: String,

    /// IANA zone id. Never rejected here: unknown or malformed zones fall back to UTC during normalization.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Delivery channels in caller order (e.g. "email", "sms").
    #[serde(default)]
    pub channels: Option<Vec<String>>,

    #[serde(default)]
    pub channel_configs: Option<BTreeMap<String, ChannelConfigValue>>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Prompt cannot be empty".into()));
    }
    Ok(())
}

impl PromptRequest {
    /// Apply the transport rules. Collects every violation, sorted, instead of stopping at the first.
    pub fn check(&self) -> Result<(), PromptError> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };
        let mut issues: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        issues.sort();
        Err(PromptError::Validation(issues))
    }
}

/// A checked request whose timezone has been resolved. Nothing downstream sees a raw zone string.
#[derive(Debug, Clone)]
pub struct NormalizedPrompt {
    pub prompt: String,
    pub email: String,
    pub timezone: Tz,
    pub channels: Option<Vec<String>>,
    pub channel_configs: Option<BTreeMap<String, ChannelConfigValue>>,
}

/// Check the request and resolve its timezone. Channels and channel configs pass through unchanged.
pub fn normalize(request: PromptRequest) -> Result<NormalizedPrompt, PromptError> {
    request.check()?;
    let timezone = resolve_timezone(request.timezone.as_deref());
    Ok(NormalizedPrompt {
        prompt: request.prompt,
        email: request.email,
        timezone,
        channels: request.channels,
        channel_configs: request.channel_configs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str, email: &str, timezone: Option<&str>) -> PromptRequest {
        PromptRequest {
            prompt: prompt.to_string(),
            email: email.to_string(),
            timezone: timezone.map(str::to_string),
            channels: None,
            channel_configs: None,
        }
    }

    fn issues(req: &PromptRequest) -> Vec<String> {
        match req.check() {
            Ok(()) => Vec::new(),
            Err(PromptError::Validation(issues)) => issues,
        }
    }

    #[test]
    fn accepts_minimal_request() {
        let req = request("Remind me to call mom", "a@b.com", None);
        assert!(req.check().is_ok());
    }

    #[test]
    fn rejects_short_prompt() {
        let got = issues(&request("short", "a@b.com", None));
        assert_eq!(
            got,
            vec!["prompt: Prompt must be between 10 and 1000 characters"]
        );
    }

    #[test]
    fn rejects_blank_prompt_even_when_long_enough() {
        let got = issues(&request("            ", "a@b.com", None));
        assert_eq!(got, vec!["prompt: Prompt cannot be empty"]);
    }

    #[test]
    fn rejects_overlong_prompt() {
        let long = "notify ".repeat(200);
        let got = issues(&request(&long, "a@b.com", None));
        assert_eq!(got.len(), 1);
        assert!(got[0].starts_with("prompt:"));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let prompt = "é".repeat(10);
        assert!(request(&prompt, "a@b.com", None).check().is_ok());
    }

    #[test]
    fn rejects_bad_email_and_reports_all_issues() {
        let got = issues(&request("short", "not-an-email", None));
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], "email: Email must be valid");
    }

    #[test]
    fn single_segment_zones_are_kept() {
        for name in ["GMT", "EST", "Japan", "Zulu", "Etc/GMT+5"] {
            let req = request("Remind me to call mom", "a@b.com", Some(name));
            assert_eq!(normalize(req).unwrap().timezone.name(), name);
        }
    }

    #[test]
    fn malformed_zones_fall_back_instead_of_rejecting() {
        for bad in ["utc", "utc+2", "+02:00", "Europe/", "/Rome", "Europe Rome", ""] {
            let req = request("Remind me to call mom", "a@b.com", Some(bad));
            assert_eq!(normalize(req).unwrap().timezone, Tz::UTC, "{bad:?}");
        }
    }

    #[test]
    fn normalize_resolves_timezone_and_keeps_channels() {
        let mut req = request("Remind me to call mom", "a@b.com", Some("Europe/Rome"));
        req.channels = Some(vec!["sms".into(), "email".into()]);
        let n = normalize(req).unwrap();
        assert_eq!(n.timezone, chrono_tz::Europe::Rome);
        assert_eq!(n.channels, Some(vec!["sms".to_string(), "email".to_string()]));
    }

    #[test]
    fn normalize_falls_back_for_unknown_zone() {
        let req = request("Remind me to call mom", "a@b.com", Some("Mars/Olympus_Mons"));
        assert_eq!(normalize(req).unwrap().timezone, Tz::UTC);
    }

    #[test]
    fn deserializes_camel_case_body_with_scalar_configs() {
        let req: PromptRequest = serde_json::from_str(
            r#"{
                "prompt": "Send me an alert",
                "email": "a@b.com",
                "channels": ["discord"],
                "channelConfigs": { "discord": "https://hook", "retries": 3, "loud": true, "extra": null }
            }"#,
        )
        .unwrap();
        let configs = req.channel_configs.unwrap();
        assert_eq!(configs["discord"].to_string(), "https://hook");
        assert_eq!(configs["retries"].to_string(), "3");
        assert_eq!(configs["loud"].to_string(), "true");
        assert_eq!(configs["extra"], ChannelConfigValue::Null);
        assert_eq!(configs["extra"].to_string(), "null");
    }

    #[test]
    fn nested_config_values_are_rejected() {
        let res: Result<PromptRequest, _> = serde_json::from_str(
            r#"{ "prompt": "Send me an alert", "email": "a@b.com", "channelConfigs": { "x": [1] } }"#,
        );
        assert!(res.is_err());
    }
}
