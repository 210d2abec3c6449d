//! Gateway: HTTP surface over the prompt core.
//!
//! One POST route for validation and one GET route for liveness, behind CORS and optional JWT auth.

mod protocol;
mod server;

pub use protocol::{ApiError, HEALTH_PATH, HEALTH_TEXT, VALIDATE_PROMPT_PATH};
pub use server::{router, run_gateway, GatewayState};
