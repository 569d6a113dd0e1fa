// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a typo in a config
//! file fails at startup instead of silently using a default. Durations are
//! expressed in (possibly fractional) seconds.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnrichConfig {
    /// HTTP listener and authentication settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Anthropic model provider settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Timeout budget and batch settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Payment provider and idempotency settings.
    #[serde(default)]
    pub billing: BillingConfig,

    /// Key-value store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Converts a seconds value to a [`Duration`], clamping invalid input to zero.
///
/// Validation rejects negative and non-finite values before this is reached.
pub fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "[redacted]")
}

/// HTTP listener configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Public base URL, used to build checkout success/cancel redirects.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Shared secret injected by the RapidAPI proxy. `None` disables proxy auth.
    #[serde(default)]
    pub rapidapi_proxy_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            base_url: default_base_url(),
            rapidapi_proxy_secret: None,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("base_url", &self.base_url)
            .field("rapidapi_proxy_secret", &redact(&self.rapidapi_proxy_secret))
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Search provider (Serper) configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// API key. Falls back to `SERPER_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: f64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_search_backoff_base")]
    pub backoff_base_secs: f64,

    #[serde(default = "default_search_backoff_jitter")]
    pub backoff_jitter_secs: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_search_endpoint(),
            timeout_secs: default_search_timeout(),
            retry_attempts: default_retry_attempts(),
            backoff_base_secs: default_search_backoff_base(),
            backoff_jitter_secs: default_search_backoff_jitter(),
        }
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_attempts", &self.retry_attempts)
            .field("backoff_base_secs", &self.backoff_base_secs)
            .field("backoff_jitter_secs", &self.backoff_jitter_secs)
            .finish()
    }
}

fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".to_string()
}

fn default_search_timeout() -> f64 {
    20.0
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_search_backoff_base() -> f64 {
    0.75
}

fn default_search_backoff_jitter() -> f64 {
    0.5
}

/// Anthropic API and model-chain configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key. Falls back to `ANTHROPIC_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Primary model, always first in the chain.
    #[serde(default = "default_model")]
    pub model: String,

    /// Comma-separated fallback models, tried in order after the primary.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Attempts per model before advancing the chain.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_model_backoff_base")]
    pub backoff_base_secs: f64,

    #[serde(default = "default_model_backoff_jitter")]
    pub backoff_jitter_secs: f64,

    /// Extra re-asks when structured output fails validation.
    #[serde(default = "default_validation_retries")]
    pub validation_retries: u32,

    /// Deadline for a single model attempt.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: f64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_api_version(),
            model: default_model(),
            fallback_models: default_fallback_models(),
            max_tokens: default_max_tokens(),
            retry_attempts: default_retry_attempts(),
            backoff_base_secs: default_model_backoff_base(),
            backoff_jitter_secs: default_model_backoff_jitter(),
            validation_retries: default_validation_retries(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

impl fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .field("fallback_models", &self.fallback_models)
            .field("max_tokens", &self.max_tokens)
            .field("retry_attempts", &self.retry_attempts)
            .field("backoff_base_secs", &self.backoff_base_secs)
            .field("backoff_jitter_secs", &self.backoff_jitter_secs)
            .field("validation_retries", &self.validation_retries)
            .field("call_timeout_secs", &self.call_timeout_secs)
            .finish()
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_fallback_models() -> String {
    "claude-opus-4-6".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_model_backoff_base() -> f64 {
    1.0
}

fn default_model_backoff_jitter() -> f64 {
    0.6
}

fn default_validation_retries() -> u32 {
    2
}

fn default_call_timeout() -> f64 {
    45.0
}

/// Timeout budget and batch limits for enrichment requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnrichmentConfig {
    /// Inner deadline around the search phase.
    #[serde(default = "default_search_phase_timeout")]
    pub search_timeout_secs: f64,

    /// Outer deadline around search plus model phases.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: f64,

    /// Retry hint sent with 503 responses.
    #[serde(default = "default_retry_after")]
    pub retry_after_secs: u64,

    #[serde(default = "default_batch_max_items")]
    pub batch_max_items: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: default_search_phase_timeout(),
            total_timeout_secs: default_total_timeout(),
            retry_after_secs: default_retry_after(),
            batch_max_items: default_batch_max_items(),
        }
    }
}

fn default_search_phase_timeout() -> f64 {
    30.0
}

fn default_total_timeout() -> f64 {
    75.0
}

fn default_retry_after() -> u64 {
    15
}

fn default_batch_max_items() -> usize {
    10
}

/// Payment provider (Stripe) and idempotency configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Secret API key. Falls back to `STRIPE_SECRET_KEY` when unset.
    #[serde(default)]
    pub stripe_secret_key: Option<String>,

    /// Webhook signing secret. Falls back to `STRIPE_WEBHOOK_SECRET` when unset.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    #[serde(default)]
    pub price_basic: Option<String>,

    #[serde(default)]
    pub price_pro: Option<String>,

    #[serde(default)]
    pub price_ultra: Option<String>,

    /// How long a checkout URL is replayed for the same idempotency key.
    #[serde(default = "default_checkout_ttl")]
    pub checkout_ttl_secs: u64,

    /// How long a processed webhook event id is remembered.
    #[serde(default = "default_webhook_event_ttl")]
    pub webhook_event_ttl_secs: u64,

    /// Maximum accepted age of a webhook signature timestamp.
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: u64,

    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: None,
            webhook_secret: None,
            price_basic: None,
            price_pro: None,
            price_ultra: None,
            checkout_ttl_secs: default_checkout_ttl(),
            webhook_event_ttl_secs: default_webhook_event_ttl(),
            webhook_tolerance_secs: default_webhook_tolerance(),
            api_base: default_stripe_api_base(),
        }
    }
}

impl fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingConfig")
            .field("stripe_secret_key", &redact(&self.stripe_secret_key))
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("price_basic", &self.price_basic)
            .field("price_pro", &self.price_pro)
            .field("price_ultra", &self.price_ultra)
            .field("checkout_ttl_secs", &self.checkout_ttl_secs)
            .field("webhook_event_ttl_secs", &self.webhook_event_ttl_secs)
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn default_checkout_ttl() -> u64 {
    86_400
}

fn default_webhook_event_ttl() -> u64 {
    604_800
}

fn default_webhook_tolerance() -> u64 {
    300
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite database path. `None` selects the in-process store.
    #[serde(default)]
    pub database_path: Option<String>,

    /// Interval between expired-row sweeps of the durable store.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EnrichConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.search.retry_attempts, 3);
        assert_eq!(config.search.backoff_base_secs, 0.75);
        assert_eq!(config.anthropic.model, "claude-sonnet-4-20250514");
        assert_eq!(config.anthropic.fallback_models, "claude-opus-4-6");
        assert_eq!(config.anthropic.call_timeout_secs, 45.0);
        assert_eq!(config.enrichment.total_timeout_secs, 75.0);
        assert_eq!(config.enrichment.retry_after_secs, 15);
        assert_eq!(config.billing.checkout_ttl_secs, 86_400);
        assert_eq!(config.billing.webhook_event_ttl_secs, 604_800);
        assert!(config.storage.database_path.is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = EnrichConfig::default();
        config.search.api_key = Some("serper-secret".into());
        config.anthropic.api_key = Some("sk-ant-secret".into());
        config.billing.webhook_secret = Some("whsec_secret".into());
        config.server.rapidapi_proxy_secret = Some("proxy-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("sk-ant-secret"));
        assert!(!debug.contains("whsec_secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn secs_clamps_invalid_values() {
        assert_eq!(secs(1.5), Duration::from_millis(1500));
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f64::NAN), Duration::ZERO);
    }
}
