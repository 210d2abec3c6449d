//! Gateway HTTP server: prompt validation and health routes.

use crate::auth::{self, TokenVerifier};
use crate::config::{self, AuthMode, Config, CorsConfig};
use crate::gateway::protocol::{ApiError, HEALTH_PATH, HEALTH_TEXT, VALIDATE_PROMPT_PATH};
use crate::prompt::{self, PromptRequest, ValidationResult};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};

/// Shared, read-only state for handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// None when auth mode is none; every caller is then anonymous.
    pub verifier: Option<Arc<TokenVerifier>>,
}

impl GatewayState {
    pub fn from_config(config: Config) -> Result<Self> {
        let verifier = TokenVerifier::from_config(&config)?.map(Arc::new);
        Ok(Self {
            config: Arc::new(config),
            verifier,
        })
    }
}

/// Build the application router with CORS, body limit, and panic recovery.
pub fn router(state: GatewayState) -> Router {
    let cors = cors_layer(&state.config.cors);
    let body_limit = state.config.server.max_body_bytes;
    Router::new()
        .route(VALIDATE_PROMPT_PATH, post(validate_prompt))
        .route(HEALTH_PATH, get(health_http))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);
    if cors.allowed_origins.iter().any(|o| o.trim() == "*") {
        return layer.allow_origin(AnyOrigin);
    }
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("ignoring invalid CORS origin: {:?}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

fn bind_address(bind: &str, port: u16) -> String {
    if bind.contains(':') {
        format!("[{}]:{}", bind, port)
    } else {
        format!("{}:{}", bind, port)
    }
}

pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.server.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) && config.auth.mode == AuthMode::None {
        anyhow::bail!(
            "refusing to bind gateway to {} without auth (set auth.mode to \"jwt\" and auth.secret or NOTIFYME_JWT_SECRET)",
            bind
        );
    }
    let port = config.server.port;
    let state = GatewayState::from_config(config)?;
    if state.verifier.is_none() {
        log::warn!("auth disabled; all requests are treated as anonymous");
    }
    let app = router(state);

    let bind_addr = bind_address(&bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET /api/v1/health returns a static liveness string.
async fn health_http() -> &'static str {
    HEALTH_TEXT
}

/// POST /api/v1/validate-prompt: authenticate, check and normalize the body, evaluate.
async fn validate_prompt(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ValidationResult>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let identity = auth::authenticate(state.verifier.as_deref(), &headers).map_err(|e| {
        log::warn!("[{}] rejected token: {}", request_id, e);
        e
    })?;
    log::info!(
        "[{}] authenticated user: {} (id: {})",
        request_id,
        identity.email.as_deref().unwrap_or("-"),
        identity.subject
    );

    let request: PromptRequest = serde_json::from_slice(&body)?;
    log::debug!("[{}] prompt from {}: {}", request_id, request.email, request.prompt);
    let normalized = prompt::normalize(request).map_err(|e| {
        log::info!("[{}] {}", request_id, e);
        e
    })?;

    let result = prompt::evaluate(&normalized, chrono::Utc::now());
    log::info!("[{}] {}", request_id, result.message);
    Ok(Json(result))
}

/// A panic inside a handler still answers with a failed `ValidationResult`.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown error".to_string()
    };
    log::error!("handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ValidationResult::failure(detail)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv6_bind_is_bracketed() {
        assert_eq!(bind_address("127.0.0.1", 8080), "127.0.0.1:8080");
        assert_eq!(bind_address("::1", 8080), "[::1]:8080");
    }

    #[tokio::test]
    async fn panic_payload_becomes_failed_result() {
        let resp = panic_response(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let result: ValidationResult = serde_json::from_slice(&body).unwrap();
        assert!(!result.success);
        assert_eq!(result.data, "{}");
        assert!(result.message.contains("boom"), "{}", result.message);
    }

    #[tokio::test]
    async fn refuses_public_bind_without_auth() {
        let mut config = Config::default();
        config.server.bind = "0.0.0.0".to_string();
        let err = run_gateway(config).await.unwrap_err();
        assert!(err.to_string().contains("refusing to bind"));
    }
}
