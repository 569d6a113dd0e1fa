// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic structured-extraction provider.
//!
//! The model is forced to call a single `enrichment_response` tool whose
//! input schema is the enrichment output schema. Tool input that fails to
//! parse or validate is sent back as an error `tool_result` and the model is
//! asked again, up to the request's `validation_retries`.

pub mod client;
pub mod types;

use async_trait::async_trait;
use enrich_config::model::AnthropicConfig;
use enrich_core::traits::{ModelProvider, PluginAdapter};
use enrich_core::types::ExtractionRequest;
use enrich_core::{AdapterType, DataType, EnrichError, EnrichmentResponse, HealthStatus, ProviderError};
use tracing::{debug, info, warn};

use crate::client::AnthropicClient;
use crate::types::{
    ApiContent, ApiContentBlock, ApiMessage, MessageRequest, MessageResponse,
    ResponseContentBlock, ToolChoice, ToolDefinition,
};

/// Name of the forced output tool.
pub const TOOL_NAME: &str = "enrichment_response";
const TOOL_DESCRIPTION: &str = "Return the structured enrichment result for the input.";
const MISSING_KEY: &str = "ANTHROPIC_API_KEY not configured";

/// Anthropic adapter implementing [`ModelProvider`].
#[derive(Debug)]
pub struct AnthropicProvider {
    client: Option<AnthropicClient>,
}

impl AnthropicProvider {
    /// Builds the provider. The API key comes from config, then the
    /// `ANTHROPIC_API_KEY` environment variable. Without one the provider
    /// still constructs, but every extraction fails as not configured.
    pub fn new(config: &AnthropicConfig) -> Result<Self, EnrichError> {
        let client = match enrich_config::resolve_secret(
            config.api_key.as_deref(),
            "ANTHROPIC_API_KEY",
        ) {
            Some(key) => Some(AnthropicClient::new(&key, &config.api_version)?),
            None => {
                warn!("{MISSING_KEY}; model calls will fail");
                None
            }
        };
        info!(model = %config.model, "Anthropic provider initialized");
        Ok(Self { client })
    }

    #[cfg(test)]
    fn with_client(client: AnthropicClient) -> Self {
        Self {
            client: Some(client),
        }
    }
}

fn output_tool(schema: &serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        name: TOOL_NAME.to_string(),
        description: TOOL_DESCRIPTION.to_string(),
        input_schema: schema.clone(),
    }
}

/// Parses and checks one tool input.
fn parse_output(input: &serde_json::Value, expected: DataType) -> Result<EnrichmentResponse, String> {
    let response: EnrichmentResponse =
        serde_json::from_value(input.clone()).map_err(|e| format!("schema mismatch: {e}"))?;
    response.validate(expected)?;
    Ok(response)
}

/// Assistant turn echoing what the model produced, for the re-ask transcript.
fn echo_assistant(response: &MessageResponse) -> Option<ApiMessage> {
    let blocks: Vec<ApiContentBlock> = response
        .content
        .iter()
        .map(|block| match block {
            ResponseContentBlock::Text { text } => ApiContentBlock::Text { text: text.clone() },
            ResponseContentBlock::ToolUse { id, name, input } => ApiContentBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
        })
        .collect();
    (!blocks.is_empty()).then(|| ApiMessage {
        role: "assistant".into(),
        content: ApiContent::Blocks(blocks),
    })
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Model
    }

    async fn health_check(&self) -> Result<HealthStatus, EnrichError> {
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy(MISSING_KEY.into()),
        })
    }

    async fn shutdown(&self) -> Result<(), EnrichError> {
        Ok(())
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<EnrichmentResponse, ProviderError> {
        let Some(client) = &self.client else {
            return Err(ProviderError::NotConfigured(MISSING_KEY.into()));
        };

        let tool = output_tool(&request.schema);
        let mut messages: Vec<ApiMessage> = request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.clone(),
                content: ApiContent::Text(m.content.clone()),
            })
            .collect();

        let attempts = request.validation_retries.saturating_add(1);
        let mut problem = String::new();

        for attempt in 1..=attempts {
            let api_request = MessageRequest {
                model: request.model.clone(),
                messages: messages.clone(),
                system: Some(request.system_prompt.clone()),
                max_tokens: request.max_tokens,
                tools: vec![tool.clone()],
                tool_choice: Some(ToolChoice::tool(TOOL_NAME)),
            };

            let response = match client.complete_message(&api_request).await {
                Ok(response) => response,
                Err(e) if attempt == 1 => return Err(e),
                // Transport failures during a re-ask surface wrapped; the
                // classifier recognises transient ones by their text.
                Err(e) => {
                    return Err(ProviderError::ValidationExhausted {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            };

            let echo = echo_assistant(&response);
            let feedback = match response.tool_call(TOOL_NAME) {
                Some((id, input)) => match parse_output(input, request.data_type) {
                    Ok(output) => {
                        debug!(model = %request.model, attempt, "structured output accepted");
                        return Ok(output);
                    }
                    Err(reason) => {
                        problem = reason;
                        ApiMessage {
                            role: "user".into(),
                            content: ApiContent::Blocks(vec![ApiContentBlock::ToolResult {
                                tool_use_id: id.to_string(),
                                content: format!(
                                    "Validation failed: {problem}. Call {TOOL_NAME} again with corrected input."
                                ),
                                is_error: Some(true),
                            }]),
                        }
                    }
                },
                None => {
                    problem = format!("response did not call the {TOOL_NAME} tool");
                    ApiMessage::user_text(format!("Respond only by calling the {TOOL_NAME} tool."))
                }
            };

            debug!(model = %request.model, attempt, problem = %problem, "structured output rejected");
            // With nothing to echo the same transcript is re-sent.
            if let Some(echo) = echo {
                messages.push(echo);
                messages.push(feedback);
            }
        }

        Err(ProviderError::ValidationExhausted {
            attempts,
            message: problem,
        })
    }
}
