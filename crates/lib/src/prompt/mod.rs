//! Prompt validation core: normalize the request, evaluate it, synthesize the result.
//!
//! Stateless and synchronous. The gateway calls `normalize` then `evaluate`; the CLI does the same offline.

mod evaluator;
mod request;
mod result;
mod timezone;

pub use evaluator::{
    evaluate, is_notification_request, is_out_of_bounds, mock_schedule, synthesize,
    SynthesisError, NO_REQUEST_REASON, TOO_LONG_REASON, TRIGGER_KEYWORDS,
};
pub use request::{
    normalize, ChannelConfigValue, NormalizedPrompt, PromptError, PromptRequest,
    MAX_PROMPT_CHARS, MIN_PROMPT_CHARS,
};
pub use result::{Metadata, Summary, ValidationPayload, ValidationResult, Validity, WhenNotify};
pub use timezone::resolve_timezone;
