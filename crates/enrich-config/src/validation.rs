// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks run after deserialization.
//!
//! Every failing rule is reported; validation does not stop at the first.

use crate::diagnostic::ConfigError;
use crate::model::EnrichConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const MAX_BATCH_ITEMS: usize = 100;

pub fn validate_config(config: &EnrichConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let server = &config.server;
    if server.host.trim().is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    }
    if server.port == 0 {
        errors.push(ConfigError::validation("server.port must be non-zero"));
    }
    if !LOG_LEVELS.contains(&server.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "server.log_level `{}` must be one of: {}",
            server.log_level,
            LOG_LEVELS.join(", ")
        )));
    }
    check_url(&mut errors, "server.base_url", &server.base_url);

    let search = &config.search;
    check_url(&mut errors, "search.endpoint", &search.endpoint);
    check_positive(&mut errors, "search.timeout_secs", search.timeout_secs);
    check_attempts(&mut errors, "search.retry_attempts", search.retry_attempts);
    check_non_negative(&mut errors, "search.backoff_base_secs", search.backoff_base_secs);
    check_non_negative(
        &mut errors,
        "search.backoff_jitter_secs",
        search.backoff_jitter_secs,
    );

    let anthropic = &config.anthropic;
    if anthropic.model.trim().is_empty() {
        errors.push(ConfigError::validation("anthropic.model must not be empty"));
    }
    if anthropic.max_tokens == 0 {
        errors.push(ConfigError::validation("anthropic.max_tokens must be non-zero"));
    }
    check_attempts(&mut errors, "anthropic.retry_attempts", anthropic.retry_attempts);
    check_non_negative(
        &mut errors,
        "anthropic.backoff_base_secs",
        anthropic.backoff_base_secs,
    );
    check_non_negative(
        &mut errors,
        "anthropic.backoff_jitter_secs",
        anthropic.backoff_jitter_secs,
    );
    check_positive(
        &mut errors,
        "anthropic.call_timeout_secs",
        anthropic.call_timeout_secs,
    );

    let enrichment = &config.enrichment;
    check_positive(
        &mut errors,
        "enrichment.search_timeout_secs",
        enrichment.search_timeout_secs,
    );
    check_positive(
        &mut errors,
        "enrichment.total_timeout_secs",
        enrichment.total_timeout_secs,
    );
    if enrichment.search_timeout_secs > enrichment.total_timeout_secs {
        errors.push(ConfigError::validation(format!(
            "enrichment.search_timeout_secs ({}) must not exceed enrichment.total_timeout_secs ({})",
            enrichment.search_timeout_secs, enrichment.total_timeout_secs
        )));
    }
    if !(1..=MAX_BATCH_ITEMS).contains(&enrichment.batch_max_items) {
        errors.push(ConfigError::validation(format!(
            "enrichment.batch_max_items must be between 1 and {MAX_BATCH_ITEMS}, got {}",
            enrichment.batch_max_items
        )));
    }

    let billing = &config.billing;
    check_url(&mut errors, "billing.api_base", &billing.api_base);
    for (key, ttl) in [
        ("billing.checkout_ttl_secs", billing.checkout_ttl_secs),
        ("billing.webhook_event_ttl_secs", billing.webhook_event_ttl_secs),
        ("billing.webhook_tolerance_secs", billing.webhook_tolerance_secs),
    ] {
        if ttl == 0 {
            errors.push(ConfigError::validation(format!("{key} must be non-zero")));
        }
    }

    if let Some(path) = &config.storage.database_path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty when set",
        ));
    }
    if config.storage.sweep_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "storage.sweep_interval_secs must be non-zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "{key} `{value}` must start with http:// or https://"
        )));
    }
}

fn check_positive(errors: &mut Vec<ConfigError>, key: &str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(ConfigError::validation(format!(
            "{key} must be a positive number of seconds, got {value}"
        )));
    }
}

fn check_non_negative(errors: &mut Vec<ConfigError>, key: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(ConfigError::validation(format!(
            "{key} must be non-negative, got {value}"
        )));
    }
}

fn check_attempts(errors: &mut Vec<ConfigError>, key: &str, value: u32) {
    if value == 0 {
        errors.push(ConfigError::validation(format!("{key} must be at least 1")));
    }
}
