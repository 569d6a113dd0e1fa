// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the enrichment service.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across adapter traits and orchestration.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Key-value store failures (database open, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A provider failed with an error that must not be retried.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Caller input failed validation (bad schema, oversized query).
    #[error("validation error: {0}")]
    Validation(String),

    /// Checkout requested for a plan that cannot be purchased.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// A provider stayed unavailable after retries and fallbacks.
    #[error("{message}")]
    UpstreamUnavailable {
        /// Human-readable provider name ("Search provider", "LLM provider").
        provider: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request exceeded its timeout budget.
    #[error("enrichment timed out in {phase} phase after {budget:?}")]
    EnrichmentTimeout {
        phase: BudgetPhase,
        budget: Duration,
    },

    /// The caller cancelled the operation. Never converted into another error.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EnrichError {
    /// Wraps any error as a storage failure.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage { source: err.into() }
    }

    /// Builds an upstream-unavailable error for the named provider.
    pub fn upstream(provider: &str, message: impl Into<String>, source: Option<ProviderError>) -> Self {
        Self::UpstreamUnavailable {
            provider: provider.to_string(),
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Returns true for failures that should be surfaced as "retry later".
    pub fn is_service_unavailable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::EnrichmentTimeout { .. }
        )
    }
}

/// Which deadline of the timeout budget expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BudgetPhase {
    /// The inner deadline around search gathering.
    Search,
    /// The outer deadline around the whole request.
    Total,
}

/// A typed failure reported by an external provider call.
///
/// The display strings are stable: the error classifier matches on them
/// for errors wrapped by structured-output validation retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or was reset.
    #[error("connection error: {0}")]
    Connection(String),

    /// The provider signalled rate limiting (HTTP 429).
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// The provider failed server-side (HTTP 5xx).
    #[error("server error (error code: {status}): {message}")]
    InternalServer { status: u16, message: String },

    /// Any other non-success HTTP status.
    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Structured output kept failing validation after all re-asks.
    #[error("structured output invalid after {attempts} attempts: {message}")]
    ValidationExhausted { attempts: u32, message: String },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider is missing credentials or configuration.
    #[error("{0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited(_) => Some(429),
            Self::InternalServer { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Maps a non-success HTTP status and body text to the matching variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited(message),
            500..=599 => Self::InternalServer { status, message },
            _ => Self::Status { status, message },
        }
    }
}
