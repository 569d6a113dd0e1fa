// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Enrichment data model shared by the orchestrators, adapters, and gateway.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::EnrichError;

/// Maximum length of `raw_data` after trimming, in characters.
pub const MAX_RAW_DATA_CHARS: usize = 2000;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Search,
    Model,
    Payment,
    Store,
    Observability,
}

/// The kind of identifier being enriched.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Company,
    Address,
    Person,
    Domain,
}

/// A validated enrichment request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EnrichmentRequestBody")]
pub struct EnrichmentRequest {
    raw_data: String,
    data_type: DataType,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EnrichmentRequestBody {
    raw_data: String,
    #[serde(default = "default_data_type")]
    data_type: String,
}

fn default_data_type() -> String {
    "company".to_string()
}

impl TryFrom<EnrichmentRequestBody> for EnrichmentRequest {
    type Error = EnrichError;

    fn try_from(body: EnrichmentRequestBody) -> Result<Self, Self::Error> {
        Self::new(&body.raw_data, &body.data_type)
    }
}

impl EnrichmentRequest {
    /// Validates and builds a request.
    ///
    /// `raw_data` is trimmed and must hold 1..=2000 characters; `data_type`
    /// is matched case-insensitively.
    pub fn new(raw_data: &str, data_type: &str) -> Result<Self, EnrichError> {
        let raw_data = raw_data.trim();
        let len = raw_data.chars().count();
        if len == 0 {
            return Err(EnrichError::Validation("raw_data must not be empty".into()));
        }
        if len > MAX_RAW_DATA_CHARS {
            return Err(EnrichError::Validation(format!(
                "raw_data must be at most {MAX_RAW_DATA_CHARS} characters, got {len}"
            )));
        }
        let data_type = data_type.trim().parse::<DataType>().map_err(|_| {
            EnrichError::Validation(
                "data_type must be one of: company, address, person, domain".into(),
            )
        })?;
        Ok(Self {
            raw_data: raw_data.to_string(),
            data_type,
        })
    }

    pub fn raw_data(&self) -> &str {
        &self.raw_data
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// A batch of enrichment requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchEnrichmentRequest {
    /// Items to enrich, processed concurrently.
    pub items: Vec<EnrichmentRequest>,
}

/// Structured company information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompanyInfo {
    /// Official company name.
    pub name: String,
    /// Company website domain.
    #[serde(default)]
    pub domain: Option<String>,
    /// Primary industry or sector.
    #[serde(default)]
    pub industry: Option<String>,
    /// Brief company description.
    #[serde(default)]
    pub description: Option<String>,
    /// Headquarters location.
    #[serde(default)]
    pub headquarters: Option<String>,
    /// Year the company was founded.
    #[serde(default)]
    pub founded_year: Option<i32>,
    /// Approximate employee count range (e.g. "1000-5000").
    #[serde(default)]
    pub employee_count: Option<String>,
    /// LinkedIn company page URL.
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

/// Structured postal address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AddressInfo {
    /// Street address.
    #[serde(default)]
    pub street: Option<String>,
    /// City name.
    #[serde(default)]
    pub city: Option<String>,
    /// State or province.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal or ZIP code.
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Country name.
    pub country: String,
    /// Full formatted address.
    pub formatted_address: String,
}

/// Professional information about a person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonInfo {
    /// Full name of the person.
    pub full_name: String,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Professional title or role.
    #[serde(default)]
    pub title: Option<String>,
    /// Current company.
    #[serde(default)]
    pub company: Option<String>,
    /// LinkedIn profile URL.
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

/// Information about a website domain and its owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DomainInfo {
    /// The domain name.
    pub domain: String,
    /// Company that owns the domain.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Primary industry or sector.
    #[serde(default)]
    pub industry: Option<String>,
    /// Brief description of the website or company.
    #[serde(default)]
    pub description: Option<String>,
    /// Headquarters location.
    #[serde(default)]
    pub headquarters: Option<String>,
    /// Year founded.
    #[serde(default)]
    pub founded_year: Option<i32>,
    /// Approximate employee count.
    #[serde(default)]
    pub employee_count: Option<String>,
    /// Technologies used by the website.
    #[serde(default)]
    pub technologies: Option<Vec<String>>,
    /// Social media profile URLs keyed by network.
    #[serde(default)]
    pub social_profiles: Option<BTreeMap<String, String>>,
}

/// Structured enrichment output.
///
/// At most the payload matching `data_type` is populated; a successful
/// response always carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnrichmentResponse {
    /// Whether enrichment was successful.
    pub success: bool,
    /// Type of data that was enriched.
    pub data_type: DataType,
    /// The original raw input.
    pub original_input: String,
    /// Enriched company data (for data_type=company).
    #[serde(default)]
    pub company: Option<CompanyInfo>,
    /// Parsed address data (for data_type=address).
    #[serde(default)]
    pub address: Option<AddressInfo>,
    /// Person data (for data_type=person).
    #[serde(default)]
    pub person: Option<PersonInfo>,
    /// Domain data (for data_type=domain).
    #[serde(default)]
    pub domain_info: Option<DomainInfo>,
    /// Confidence in the enriched data, between 0 and 1.
    pub confidence_score: f64,
    /// Source URLs used for enrichment.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl EnrichmentResponse {
    /// A failed result for `request`: no payload, zero confidence.
    pub fn failed(request: &EnrichmentRequest) -> Self {
        Self {
            success: false,
            data_type: request.data_type(),
            original_input: request.raw_data().to_string(),
            company: None,
            address: None,
            person: None,
            domain_info: None,
            confidence_score: 0.0,
            sources: Vec::new(),
        }
    }

    /// JSON Schema the model's structured output must conform to.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(EnrichmentResponse))
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
    }

    /// Which payload variants are populated.
    pub fn populated_payloads(&self) -> Vec<DataType> {
        let mut present = Vec::new();
        if self.company.is_some() {
            present.push(DataType::Company);
        }
        if self.address.is_some() {
            present.push(DataType::Address);
        }
        if self.person.is_some() {
            present.push(DataType::Person);
        }
        if self.domain_info.is_some() {
            present.push(DataType::Domain);
        }
        present
    }

    /// Checks the invariants the schema alone cannot express.
    pub fn validate(&self, expected: DataType) -> Result<(), String> {
        if !self.confidence_score.is_finite() || !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(format!(
                "confidence_score must be between 0 and 1, got {}",
                self.confidence_score
            ));
        }
        if self.data_type != expected {
            return Err(format!(
                "data_type must be `{expected}`, got `{}`",
                self.data_type
            ));
        }
        let present = self.populated_payloads();
        if let Some(other) = present.iter().find(|t| **t != expected) {
            return Err(format!(
                "only the `{expected}` payload may be populated, found `{other}`"
            ));
        }
        if self.success && present.is_empty() {
            return Err(format!(
                "a successful response must populate the `{expected}` payload"
            ));
        }
        Ok(())
    }
}

/// Summary of a batch enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEnrichmentResponse {
    pub success: bool,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<EnrichmentResponse>,
}

impl BatchEnrichmentResponse {
    pub fn from_results(results: Vec<EnrichmentResponse>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            success: true,
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }
}

// --- Search provider types ---

/// One call to the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub num_results: u8,
}

/// A single organic search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

// --- Model provider types ---

/// A message in the model conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// A structured-extraction call against one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub messages: Vec<PromptMessage>,
    /// Target JSON Schema for the structured output.
    pub schema: serde_json::Value,
    /// The payload variant the response must carry.
    pub data_type: DataType,
    /// Extra re-asks allowed when the output fails validation.
    pub validation_retries: u32,
}
