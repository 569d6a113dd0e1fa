// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication middleware for the enrichment routes.
//!
//! Checked in order:
//! 1. RapidAPI proxy secret (`X-RapidAPI-Proxy-Secret`), unmetered
//! 2. Service API key (`X-API-Key`), metered against the key's plan
//!
//! Proxy auth is only honored when a secret is configured.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use enrich_billing::KeyValidation;

use crate::error::ApiError;
use crate::server::AppState;

pub const PROXY_SECRET_HEADER: &str = "x-rapidapi-proxy-secret";
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Default)]
pub struct AuthConfig {
    pub rapidapi_proxy_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "rapidapi_proxy_secret",
                &self.rapidapi_proxy_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Authenticated by the marketplace proxy; usage is metered upstream.
    Proxy,
    ApiKey { key: String, remaining: u32 },
}

impl Caller {
    /// The key to meter, if any.
    pub fn metered_key(&self) -> Option<&str> {
        match self {
            Self::Proxy => None,
            Self::ApiKey { key, .. } => Some(key),
        }
    }
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.auth.rapidapi_proxy_secret.as_deref()
        && header(&request, PROXY_SECRET_HEADER) == Some(expected)
    {
        request.extensions_mut().insert(Caller::Proxy);
        return Ok(next.run(request).await);
    }

    let Some(key) = header(&request, API_KEY_HEADER).map(str::to_string) else {
        return Err(ApiError::Unauthorized(
            "Missing authentication. Provide X-API-Key header. Get a free key at /api/v1/register"
                .into(),
        ));
    };

    let validation = state
        .accounts
        .validate(&key)
        .await
        .map_err(|e| ApiError::from_enrich(e, state.retry_after_secs))?;

    let caller = match validation {
        None => {
            tracing::debug!("unknown API key rejected");
            return Err(ApiError::Unauthorized("Invalid API key".into()));
        }
        Some(KeyValidation::RateLimited { plan }) => {
            return Err(ApiError::RateLimited(format!(
                "Rate limit exceeded. Upgrade your plan at /api/v1/checkout. Current plan: {plan}"
            )));
        }
        Some(KeyValidation::Valid { remaining, .. }) => Caller::ApiKey { key, remaining },
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
