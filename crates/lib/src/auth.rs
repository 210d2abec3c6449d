//! Bearer-token authentication for the gateway.
//!
//! Tokens are HS256 JWTs signed by the identity provider with a shared secret. Only the subject
//! and email claims are used, and only for logging; they never affect prompt evaluation.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use jwt::VerifyWithKey;
use serde::Deserialize;
use sha2::Sha256;

use crate::config::{self, AuthMode, Config};

/// Caller identity decoded from the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
}

impl Identity {
    /// Identity used when auth mode is none.
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            email: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token expired")]
    Expired,
    #[error("The required audience is missing")]
    Audience,
    #[error("unexpected token issuer")]
    Issuer,
    #[error("token has no subject")]
    MissingSubject,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(a) => a == expected,
            Audience::Many(list) => list.iter().any(|a| a == expected),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
    email: Option<String>,
    aud: Option<Audience>,
    iss: Option<String>,
    exp: Option<i64>,
}

/// Verifies HS256 tokens against the shared secret, plus optional audience and issuer.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Hmac<Sha256>,
    audience: Option<String>,
    issuer: Option<String>,
}

impl TokenVerifier {
    pub fn new(
        secret: &str,
        audience: Option<String>,
        issuer: Option<String>,
    ) -> Result<Self, AuthError> {
        let key = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| AuthError::Invalid(format!("signing key: {}", e)))?;
        Ok(Self {
            key,
            audience,
            issuer,
        })
    }

    /// Build the verifier for the configured auth mode. None when auth is disabled; error when jwt mode has no secret.
    pub fn from_config(config: &Config) -> anyhow::Result<Option<Self>> {
        if config.auth.mode == AuthMode::None {
            return Ok(None);
        }
        let Some(secret) = config::resolve_jwt_secret(config) else {
            anyhow::bail!(
                "auth.mode is \"jwt\" but no secret is configured (set auth.secret or NOTIFYME_JWT_SECRET)"
            );
        };
        let verifier = Self::new(
            &secret,
            config.auth.audience.clone().filter(|a| !a.trim().is_empty()),
            config.auth.issuer.clone().filter(|i| !i.trim().is_empty()),
        )?;
        Ok(Some(verifier))
    }

    /// Verify signature, expiry, audience, and issuer; return the caller identity.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let claims: Claims = token
            .verify_with_key(&self.key)
            .map_err(|e| AuthError::Invalid(e.to_string()))?;
        if let Some(exp) = claims.exp {
            if exp <= now.timestamp() {
                return Err(AuthError::Expired);
            }
        }
        if let Some(expected) = &self.audience {
            if !claims.aud.as_ref().is_some_and(|a| a.contains(expected)) {
                return Err(AuthError::Audience);
            }
        }
        if let Some(expected) = &self.issuer {
            if claims.iss.as_deref() != Some(expected.as_str()) {
                return Err(AuthError::Issuer);
            }
        }
        let subject = claims
            .sub
            .filter(|s| !s.trim().is_empty())
            .ok_or(AuthError::MissingSubject)?;
        Ok(Identity {
            subject,
            email: claims.email,
        })
    }
}

/// Token from `Authorization: Bearer <token>`, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Resolve the caller: anonymous when no verifier is configured, otherwise the verified bearer token.
pub fn authenticate(
    verifier: Option<&TokenVerifier>,
    headers: &HeaderMap,
) -> Result<Identity, AuthError> {
    let Some(verifier) = verifier else {
        return Ok(Identity::anonymous());
    };
    let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
    verifier.verify(token, Utc::now())
}
