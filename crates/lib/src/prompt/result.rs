//! Outbound result: the top-level `ValidationResult` and the payload encoded into its `data` field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response body of `POST /api/v1/validate-prompt`. `data` is itself a JSON document; callers decode twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether evaluation completed; not whether the prompt was judged valid.
    pub success: bool,
    pub message: String,
    pub data: String,
}

impl ValidationResult {
    /// Failed evaluation: error text in the message and an empty object as data.
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            message: format!("Validation failed: {}", error),
            data: "{}".to_string(),
        }
    }

    /// Decode `data` into the structured payload.
    pub fn payload(&self) -> serde_json::Result<ValidationPayload> {
        serde_json::from_str(&self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationPayload {
    pub response_type: String,
    pub timestamp: String,
    pub generated_by: String,
    pub user_timezone: String,
    pub when_notify: WhenNotify,
    pub validity: Validity,
    pub summary: Summary,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_configs: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenNotify {
    pub detected: String,
    pub cron_expression: String,
    pub date_time: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validity {
    pub out_of_bounds_prompt_length: bool,
    pub offensive_language_detected: bool,
    pub nasty_instruction_detected: bool,
    pub purpose_valid: bool,
    pub reasonable_usage: bool,
    pub self_enforcing: bool,
    pub valid_prompt: bool,
    /// Always serialized; `null` exactly when `valid_prompt` is true.
    pub invalid_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub language: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub model_version: String,
    pub confidence_score: f64,
    pub policy_enforced: bool,
    pub tags: Vec<String>,
}
