// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retryable-versus-fatal classification of provider errors.
//!
//! Search and model providers use different retryable status sets; the model
//! side additionally inspects the text of exhausted validation retries, which
//! may wrap an overload or rate-limit failure.

use enrich_core::ProviderError;

/// HTTP statuses retried against the model provider.
pub const MODEL_RETRYABLE_STATUSES: &[u16] = &[408, 409, 425, 429, 500, 502, 503, 504, 529];

/// HTTP statuses retried against the search provider.
pub const SEARCH_RETRYABLE_STATUSES: &[u16] = &[408, 425, 429, 500, 502, 503, 504];

/// HTTP statuses treated as a temporary payment provider outage.
/// 409 is an in-flight request with the same idempotency key.
pub const PAYMENT_RETRYABLE_STATUSES: &[u16] = &[409, 429, 500, 502, 503, 504];

/// Text markers that make a wrapped validation failure retryable.
const TRANSIENT_MARKERS: &[&str] = &["overloaded", "rate limit", "error code: 529"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    /// Timeout, connection failure, or a retryable non-5xx status.
    Transient,
    RateLimited,
    /// 5xx, including overload.
    ServerError,
    Fatal,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        self != Self::Fatal
    }
}

fn class_for_status(status: u16, retryable: &[u16]) -> ErrorClass {
    if !retryable.contains(&status) {
        ErrorClass::Fatal
    } else if status == 429 {
        ErrorClass::RateLimited
    } else if status >= 500 {
        ErrorClass::ServerError
    } else {
        ErrorClass::Transient
    }
}

pub fn classify_model_error(error: &ProviderError) -> ErrorClass {
    match error {
        ProviderError::Timeout | ProviderError::Connection(_) => ErrorClass::Transient,
        ProviderError::RateLimited(_) => ErrorClass::RateLimited,
        ProviderError::InternalServer { .. } => ErrorClass::ServerError,
        ProviderError::Status { status, .. } => {
            class_for_status(*status, MODEL_RETRYABLE_STATUSES)
        }
        ProviderError::ValidationExhausted { message, .. } => {
            let text = message.to_lowercase();
            if TRANSIENT_MARKERS.iter().any(|m| text.contains(m)) {
                ErrorClass::ServerError
            } else {
                ErrorClass::Fatal
            }
        }
        ProviderError::InvalidResponse(_) | ProviderError::NotConfigured(_) => ErrorClass::Fatal,
    }
}

pub fn classify_search_error(error: &ProviderError) -> ErrorClass {
    match error {
        ProviderError::Timeout | ProviderError::Connection(_) => ErrorClass::Transient,
        other => match other.status() {
            Some(status) => class_for_status(status, SEARCH_RETRYABLE_STATUSES),
            None => ErrorClass::Fatal,
        },
    }
}

pub fn classify_payment_error(error: &ProviderError) -> ErrorClass {
    match error {
        ProviderError::Timeout | ProviderError::Connection(_) => ErrorClass::Transient,
        other => match other.status() {
            Some(status) => class_for_status(status, PAYMENT_RETRYABLE_STATUSES),
            None => ErrorClass::Fatal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exhausted(message: &str) -> ProviderError {
        ProviderError::ValidationExhausted {
            attempts: 3,
            message: message.into(),
        }
    }

    #[test]
    fn model_network_failures_are_retryable() {
        assert!(classify_model_error(&ProviderError::Timeout).is_retryable());
        assert!(classify_model_error(&ProviderError::Connection("reset".into())).is_retryable());
        assert_eq!(
            classify_model_error(&ProviderError::RateLimited("slow".into())),
            ErrorClass::RateLimited
        );
        assert_eq!(
            classify_model_error(&ProviderError::from_status(503, "busy")),
            ErrorClass::ServerError
        );
    }

    #[test]
    fn model_status_set_membership() {
        for status in [408, 409, 425] {
            assert!(classify_model_error(&ProviderError::from_status(status, "x")).is_retryable());
        }
        for status in [400, 401, 403, 404, 422] {
            assert_eq!(
                classify_model_error(&ProviderError::from_status(status, "x")),
                ErrorClass::Fatal,
                "status {status}"
            );
        }
    }

    #[test]
    fn wrapped_validation_failures_match_on_text() {
        assert!(classify_model_error(&exhausted("Overloaded_error from upstream")).is_retryable());
        assert!(classify_model_error(&exhausted("rate limit exceeded: slow")).is_retryable());
        assert!(
            classify_model_error(&exhausted("server error (error code: 529): busy")).is_retryable()
        );
        assert!(!classify_model_error(&exhausted("confidence_score must be between 0 and 1"))
            .is_retryable());
    }

    #[test]
    fn model_config_and_decode_failures_are_fatal() {
        assert!(!classify_model_error(&ProviderError::NotConfigured("no key".into())).is_retryable());
        assert!(!classify_model_error(&ProviderError::InvalidResponse("bad".into())).is_retryable());
    }

    #[test]
    fn search_uses_narrower_status_set() {
        assert!(classify_search_error(&ProviderError::Timeout).is_retryable());
        assert!(classify_search_error(&ProviderError::from_status(429, "x")).is_retryable());
        assert!(classify_search_error(&ProviderError::from_status(502, "x")).is_retryable());
        assert!(!classify_search_error(&ProviderError::from_status(409, "x")).is_retryable());
        assert!(!classify_search_error(&ProviderError::from_status(529, "x")).is_retryable());
        assert!(!classify_search_error(&ProviderError::from_status(404, "x")).is_retryable());
        assert!(
            !classify_search_error(&ProviderError::NotConfigured("SERPER_API_KEY".into()))
                .is_retryable()
        );
    }

    #[test]
    fn payment_outages_are_retryable_and_card_errors_are_not() {
        assert!(classify_payment_error(&ProviderError::Connection("reset".into())).is_retryable());
        assert!(classify_payment_error(&ProviderError::from_status(409, "x")).is_retryable());
        assert!(classify_payment_error(&ProviderError::from_status(503, "x")).is_retryable());
        assert!(!classify_payment_error(&ProviderError::from_status(402, "x")).is_retryable());
        assert!(!classify_payment_error(&ProviderError::from_status(400, "x")).is_retryable());
    }
}
