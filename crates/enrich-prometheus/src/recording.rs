// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric descriptions and recording helpers.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed.

use metrics::{describe_counter, describe_histogram};

pub const ENRICHMENTS_TOTAL: &str = "enrich_requests_total";
pub const ENRICHMENT_LATENCY: &str = "enrich_latency_seconds";
pub const RETRIES_TOTAL: &str = "enrich_retries_total";
pub const FALLBACKS_TOTAL: &str = "enrich_model_fallbacks_total";
pub const UPSTREAM_UNAVAILABLE_TOTAL: &str = "enrich_upstream_unavailable_total";
pub const IDEMPOTENCY_HITS_TOTAL: &str = "enrich_idempotency_hits_total";
pub const WEBHOOKS_TOTAL: &str = "enrich_webhooks_total";

/// Registers descriptions. Call once after installing the recorder.
pub fn register_metrics() {
    describe_counter!(ENRICHMENTS_TOTAL, "Enrichment requests by data type and outcome");
    describe_histogram!(ENRICHMENT_LATENCY, "End-to-end enrichment latency in seconds");
    describe_counter!(RETRIES_TOTAL, "Retried upstream attempts by provider");
    describe_counter!(FALLBACKS_TOTAL, "Model chain advances away from a model");
    describe_counter!(
        UPSTREAM_UNAVAILABLE_TOTAL,
        "Requests that ended with an upstream-unavailable error"
    );
    describe_counter!(IDEMPOTENCY_HITS_TOTAL, "Replayed or deduplicated billing operations");
    describe_counter!(WEBHOOKS_TOTAL, "Webhook events by type and status");
}

/// `outcome` is one of `success`, `failed`, `unavailable`, `error`.
pub fn record_enrichment(data_type: &str, outcome: &'static str) {
    metrics::counter!(
        ENRICHMENTS_TOTAL,
        "data_type" => data_type.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_latency(data_type: &str, seconds: f64) {
    metrics::histogram!(ENRICHMENT_LATENCY, "data_type" => data_type.to_string()).record(seconds);
}

pub fn record_retry(provider: &str) {
    metrics::counter!(RETRIES_TOTAL, "provider" => provider.to_string()).increment(1);
}

/// Records that the chain gave up on `model` and moved on.
pub fn record_fallback(model: &str) {
    metrics::counter!(FALLBACKS_TOTAL, "model" => model.to_string()).increment(1);
}

pub fn record_upstream_unavailable(provider: &str) {
    metrics::counter!(UPSTREAM_UNAVAILABLE_TOTAL, "provider" => provider.to_string())
        .increment(1);
}

/// `kind` is `checkout` or `webhook`.
pub fn record_idempotency_hit(kind: &'static str) {
    metrics::counter!(IDEMPOTENCY_HITS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_webhook(event_type: &str, status: &'static str) {
    metrics::counter!(
        WEBHOOKS_TOTAL,
        "event" => event_type.to_string(),
        "status" => status
    )
    .increment(1);
}
