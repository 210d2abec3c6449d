//! Keyword evaluation and response synthesis.
//!
//! The schedule, confidence score, and cadence are fixed placeholders: every prompt gets
//! "tomorrow at 09:00 local, daily". Nothing here interprets the prompt beyond the keyword check.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use super::request::{NormalizedPrompt, MAX_PROMPT_CHARS, MIN_PROMPT_CHARS};
use super::result::{Metadata, Summary, ValidationPayload, ValidationResult, Validity, WhenNotify};

/// Substrings that mark a prompt as a notification request. Checked in order; first hit wins.
pub const TRIGGER_KEYWORDS: [&str; 11] = [
    "notify",
    "remind",
    "alert",
    "tell",
    "inform",
    "update",
    "notification",
    "reminder",
    "message",
    "email",
    "send",
];

const RESPONSE_TYPE: &str = "validation_result";
const GENERATED_BY: &str = "NotifyMe AI Validator v1.0";
const DETECTED_CADENCE: &str = "daily";
const CRON_EXPRESSION: &str = "0 9 * * *";
const SCHEDULE_HOUR: u32 = 9;
const MODEL_VERSION: &str = "1.0.0";
const CONFIDENCE_SCORE: f64 = 0.95;
const SUMMARY_PREFIX: &str = "Notification request: ";
const SUMMARY_MAX_CHARS: usize = 100;
const DEFAULT_CHANNEL: &str = "email";

pub const NO_REQUEST_REASON: &str = "The prompt does not contain a clear notification request. Please describe what you want to be notified about.";
pub const TOO_LONG_REASON: &str = "Prompt is too long. Please keep it under 1000 characters.";

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("cannot compute schedule: {0}")]
    Schedule(String),
    #[error("cannot encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// True when the prompt contains any trigger keyword (case-insensitive substring).
/// Prompts under the minimum length after trimming are never requests, whatever they contain.
pub fn is_notification_request(prompt: &str) -> bool {
    if prompt.trim().chars().count() < MIN_PROMPT_CHARS {
        return false;
    }
    let lower = prompt.to_lowercase();
    TRIGGER_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn is_out_of_bounds(prompt: &str) -> bool {
    prompt.chars().count() > MAX_PROMPT_CHARS
}

/// Next local calendar day at 09:00 in `tz`. Ambiguous local times take the earlier instant.
pub fn mock_schedule(now: DateTime<Utc>, tz: Tz) -> Result<DateTime<Tz>, SynthesisError> {
    let tomorrow = now
        .with_timezone(&tz)
        .date_naive()
        .succ_opt()
        .ok_or_else(|| SynthesisError::Schedule("no next day after the current date".into()))?;
    let local = tomorrow
        .and_hms_opt(SCHEDULE_HOUR, 0, 0)
        .ok_or_else(|| SynthesisError::Schedule("invalid schedule hour".into()))?;
    tz.from_local_datetime(&local).earliest().ok_or_else(|| {
        SynthesisError::Schedule(format!("{} does not exist in {}", local, tz.name()))
    })
}

fn invalid_reason(purpose_valid: bool, out_of_bounds: bool) -> Option<String> {
    if !purpose_valid {
        Some(NO_REQUEST_REASON.to_string())
    } else if out_of_bounds {
        Some(TOO_LONG_REASON.to_string())
    } else {
        None
    }
}

fn summary_text(prompt: &str) -> String {
    let head: String = prompt.chars().take(SUMMARY_MAX_CHARS).collect();
    format!("{}{}", SUMMARY_PREFIX, head)
}

/// Build the structured record for one request.
pub fn synthesize(
    request: &NormalizedPrompt,
    now: DateTime<Utc>,
) -> Result<ValidationPayload, SynthesisError> {
    let tz = request.timezone;
    let zone = tz.name().to_string();
    let scheduled = mock_schedule(now, tz)?;

    let purpose_valid = is_notification_request(&request.prompt);
    let out_of_bounds = is_out_of_bounds(&request.prompt);
    let valid_prompt = purpose_valid && !out_of_bounds;

    let mut tags = vec!["notification".to_string(), "reminder".to_string()];
    if let Some(channels) = &request.channels {
        tags.extend(channels.iter().cloned());
    }

    let channel_configs = request.channel_configs.as_ref().map(|configs| {
        configs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    });

    Ok(ValidationPayload {
        response_type: RESPONSE_TYPE.to_string(),
        timestamp: now
            .with_timezone(&tz)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        generated_by: GENERATED_BY.to_string(),
        user_timezone: zone.clone(),
        when_notify: WhenNotify {
            detected: DETECTED_CADENCE.to_string(),
            cron_expression: CRON_EXPRESSION.to_string(),
            date_time: scheduled.to_rfc3339_opts(SecondsFormat::Secs, true),
            timezone: zone,
        },
        validity: Validity {
            out_of_bounds_prompt_length: out_of_bounds,
            offensive_language_detected: false,
            nasty_instruction_detected: false,
            purpose_valid,
            reasonable_usage: true,
            self_enforcing: true,
            valid_prompt,
            invalid_reason: invalid_reason(purpose_valid, out_of_bounds),
        },
        summary: Summary {
            text: summary_text(&request.prompt),
            language: "en".to_string(),
            category: "general".to_string(),
            channels: request.channels.clone(),
        },
        metadata: Metadata {
            model_version: MODEL_VERSION.to_string(),
            confidence_score: CONFIDENCE_SCORE,
            policy_enforced: true,
            tags,
        },
        channel_configs,
    })
}

fn outcome_message(request: &NormalizedPrompt, validity: &Validity) -> String {
    if !validity.valid_prompt {
        return format!(
            "Prompt validation failed: {}",
            validity.invalid_reason.as_deref().unwrap_or_default()
        );
    }
    let channels = match &request.channels {
        Some(c) if !c.is_empty() => c.join(", "),
        _ => DEFAULT_CHANNEL.to_string(),
    };
    format!("Prompt validated successfully for channels: {}", channels)
}

fn encode(request: &NormalizedPrompt, now: DateTime<Utc>) -> Result<ValidationResult, SynthesisError> {
    let payload = synthesize(request, now)?;
    let message = outcome_message(request, &payload.validity);
    let data = serde_json::to_string(&payload)?;
    Ok(ValidationResult {
        success: true,
        message,
        data,
    })
}

/// Evaluate a normalized prompt at `now`. Never fails: internal errors become `success = false`.
pub fn evaluate(request: &NormalizedPrompt, now: DateTime<Utc>) -> ValidationResult {
    match encode(request, now) {
        Ok(result) => result,
        Err(e) => {
            log::error!("prompt evaluation failed: {}", e);
            ValidationResult::failure(e)
        }
    }
}
