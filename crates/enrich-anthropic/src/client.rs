// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! [`AnthropicClient`] sends one request per call and maps failures onto
//! [`ProviderError`]; retry and fallback belong to the caller.

use std::fmt;
use std::time::Duration;

use enrich_core::{EnrichError, ProviderError};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const API_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Safety net only; per-attempt deadlines are enforced by the caller.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(api_key: &str, api_version: &str) -> Result<Self, EnrichError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| EnrichError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                EnrichError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| EnrichError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the endpoint URL (wiremock in tests).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends one non-streaming request.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, ProviderError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("{}: {}", api_err.error.type_, api_err.error.message),
                Err(_) => body,
            };
            return Err(ProviderError::from_status(status.as_u16(), message));
        }

        let body = response.text().await.map_err(map_reqwest_err)?;
        serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse API response: {e}")))
    }
}

fn map_reqwest_err(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Connection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> AnthropicClient {
        AnthropicClient::new("test-api-key", "2023-06-01")
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn test_request() -> MessageRequest {
        MessageRequest {
            model: "claude-sonnet-4-20250514".into(),
            messages: vec![ApiMessage::user_text("Hello")],
            system: None,
            max_tokens: 1024,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    fn error_body(kind: &str, message: &str) -> serde_json::Value {
        serde_json::json!({"type": "error", "error": {"type": kind, "message": message}})
    }

    #[tokio::test]
    async fn sends_auth_headers_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_test",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "Hi"}],
                "model": "claude-sonnet-4-20250514",
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 10, "output_tokens": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = test_client(&server.uri())
            .complete_message(&test_request())
            .await
            .unwrap();
        assert_eq!(response.id, "msg_test");
        assert_eq!(response.usage.input_tokens, 10);
    }

    #[tokio::test]
    async fn does_not_retry_internally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(529).set_body_json(error_body("overloaded_error", "Overloaded")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete_message(&test_request())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(529));
        let text = err.to_string();
        assert!(text.contains("error code: 529"), "got: {text}");
        assert!(text.contains("overloaded_error"), "got: {text}");
    }

    #[tokio::test]
    async fn maps_rate_limit_and_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(error_body("rate_limit_error", "slow")),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(error_body("invalid_request_error", "Bad model")),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(matches!(
            client.complete_message(&test_request()).await,
            Err(ProviderError::RateLimited(_))
        ));
        match client.complete_message(&test_request()).await {
            Err(ProviderError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.contains("invalid_request_error"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparsable_success_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        assert!(matches!(
            test_client(&server.uri()).complete_message(&test_request()).await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
