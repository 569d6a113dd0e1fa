// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router tests over the full service wired on mocks.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use enrich_billing::Plan;
use enrich_core::ProviderError;
use enrich_gateway::{AppState, AuthConfig, router};
use enrich_test_utils::fixtures::checkout_completed_event;
use enrich_test_utils::{MockModelProvider, ModelReply, TestHarness, test_config};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn app(harness: &TestHarness, proxy_secret: Option<&str>) -> Router {
    router(AppState {
        enricher: harness.enricher.clone(),
        accounts: harness.accounts.clone(),
        checkout: harness.checkout.clone(),
        webhooks: harness.webhooks.clone(),
        store: harness.kv(),
        auth: AuthConfig {
            rapidapi_proxy_secret: proxy_secret.map(str::to_string),
        },
        retry_after_secs: harness.config.enrichment.retry_after_secs,
        prometheus_render: Some(Arc::new(|| "enrich_requests_total 1\n".to_string())),
        shutdown: CancellationToken::new(),
        start_time: Instant::now(),
    })
}

fn post(uri: &str, body: Value, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

async fn register(harness: &TestHarness, email: &str) -> String {
    let (status, _, body) = send(
        app(harness, None),
        post("/api/v1/register", json!({ "email": email }), &[]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["api_key"].as_str().unwrap().to_string()
}

fn enrich_body() -> Value {
    json!({ "raw_data": "Acme", "data_type": "company" })
}

#[tokio::test]
async fn health_reports_store_status() {
    let harness = TestHarness::builder().build();
    let request = Request::get("/health").body(Body::empty()).unwrap();

    let (status, _, body) = send(app(&harness, None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "healthy");
}

#[tokio::test]
async fn metrics_are_rendered_as_text() {
    let harness = TestHarness::builder().build();
    let request = Request::get("/metrics").body(Body::empty()).unwrap();

    let response = app(&harness, None).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("enrich_requests_total"));
}

#[tokio::test]
async fn registration_is_idempotent_per_email() {
    let harness = TestHarness::builder().build();

    let (_, _, first) = send(
        app(&harness, None),
        post("/api/v1/register", json!({ "email": "A@Example.com" }), &[]),
    )
    .await;
    let (_, _, second) = send(
        app(&harness, None),
        post("/api/v1/register", json!({ "email": "a@example.com" }), &[]),
    )
    .await;

    assert_eq!(first["plan"], "free");
    assert_eq!(first["requests_per_month"], 50);
    assert_eq!(first["message"], "API key created successfully");
    assert!(first["api_key"].as_str().unwrap().starts_with("enrich_"));
    assert_eq!(second["api_key"], first["api_key"]);
    assert_eq!(second["message"], "Key already exists for this email");
}

#[tokio::test]
async fn malformed_bodies_are_unprocessable() {
    let harness = TestHarness::builder().build();

    let (status, _, _) = send(
        app(&harness, None),
        post("/api/v1/register", json!({ "email": "not-an-email" }), &[]),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let key = register(&harness, "a@example.com").await;
    let (status, _, body) = send(
        app(&harness, None),
        post(
            "/api/v1/enrich",
            json!({ "raw_data": "   " }),
            &[("x-api-key", key.as_str())],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("raw_data"));

    let request = Request::post("/api/v1/enrich")
        .header("content-type", "application/json")
        .header("x-api-key", key.as_str())
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, _) = send(app(&harness, None), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn enrich_requires_a_key() {
    let harness = TestHarness::builder().build();

    let (status, _, body) = send(app(&harness, None), post("/api/v1/enrich", enrich_body(), &[])).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].as_str().unwrap().starts_with("Missing authentication"));

    let (status, _, body) = send(
        app(&harness, None),
        post("/api/v1/enrich", enrich_body(), &[("x-api-key", "enrich_nope")]),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid API key");
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn successful_enrichment_is_metered() {
    let harness = TestHarness::builder().build();
    let key = register(&harness, "a@example.com").await;

    let (status, _, body) = send(
        app(&harness, None),
        post("/api/v1/enrich", enrich_body(), &[("x-api-key", key.as_str())]),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["original_input"], "Acme");
    let record = harness.accounts.record(&key).await.unwrap().unwrap();
    assert_eq!(record.requests_used, 1);
}

#[tokio::test]
async fn exhausted_quota_is_rate_limited() {
    let harness = TestHarness::builder().build();
    let key = register(&harness, "a@example.com").await;
    harness.accounts.increment_usage(&key, 50).await.unwrap();

    let (status, _, body) = send(
        app(&harness, None),
        post("/api/v1/enrich", enrich_body(), &[("x-api-key", key.as_str())]),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["detail"].as_str().unwrap().ends_with("Current plan: free"));
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn proxy_secret_bypasses_metering_only_when_configured() {
    let harness = TestHarness::builder().build();
    let proxy = [("x-rapidapi-proxy-secret", "s3cret")];

    let (status, _, _) = send(
        app(&harness, Some("s3cret")),
        post("/api/v1/enrich", enrich_body(), &proxy),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        app(&harness, Some("other")),
        post("/api/v1/enrich", enrich_body(), &proxy),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(app(&harness, None), post("/api/v1/enrich", enrich_body(), &proxy)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upstream_outage_is_503_with_retry_hint() {
    let busy = || ModelReply::Fail(ProviderError::RateLimited("busy".into()));
    let model = MockModelProvider::new()
        .script(&test_config().anthropic.model, vec![busy(), busy(), busy()])
        .script("claude-fallback", vec![busy(), busy(), busy()]);
    let harness = TestHarness::builder().with_model(model).build();
    let key = register(&harness, "a@example.com").await;

    let (status, headers, body) = send(
        app(&harness, None),
        post("/api/v1/enrich", enrich_body(), &[("x-api-key", key.as_str())]),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(headers["retry-after"], "15");
    assert_eq!(body["detail"]["error"], "upstream_unavailable");
    assert_eq!(body["detail"]["retry_after_seconds"], 15);
    assert!(
        body["detail"]["message"]
            .as_str()
            .unwrap()
            .contains("LLM provider is temporarily unavailable")
    );
    let record = harness.accounts.record(&key).await.unwrap().unwrap();
    assert_eq!(record.requests_used, 0);
}

#[tokio::test]
async fn batch_checks_quota_for_every_item() {
    let harness = TestHarness::builder().build();
    let key = register(&harness, "a@example.com").await;
    harness.accounts.increment_usage(&key, 49).await.unwrap();
    let items = json!({
        "items": [
            { "raw_data": "Acme" },
            { "raw_data": "Jane Doe", "data_type": "person" },
        ]
    });

    let (status, _, body) = send(
        app(&harness, None),
        post("/api/v1/enrich/batch", items, &[("x-api-key", key.as_str())]),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body["detail"],
        "Not enough requests remaining. Need 2, have 1. Upgrade at /api/v1/checkout"
    );
}

#[tokio::test]
async fn batch_is_charged_per_item() {
    let harness = TestHarness::builder().build();
    let key = register(&harness, "a@example.com").await;
    let items = json!({
        "items": [
            { "raw_data": "Acme" },
            { "raw_data": "1 Main St, Springfield", "data_type": "address" },
            { "raw_data": "acme.example", "data_type": "domain" },
        ]
    });

    let (status, _, body) = send(
        app(&harness, None),
        post("/api/v1/enrich/batch", items, &[("x-api-key", key.as_str())]),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total"], 3);
    assert_eq!(body["successful"], 3);
    let record = harness.accounts.record(&key).await.unwrap().unwrap();
    assert_eq!(record.requests_used, 3);
}

#[tokio::test]
async fn batch_size_outside_limits_is_unprocessable() {
    let harness = TestHarness::builder()
        .configure(|config| config.enrichment.batch_max_items = 1)
        .build();
    let key = register(&harness, "a@example.com").await;
    let items = json!({ "items": [{ "raw_data": "A" }, { "raw_data": "B" }] });

    let (status, _, body) = send(
        app(&harness, None),
        post("/api/v1/enrich/batch", items, &[("x-api-key", key.as_str())]),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("between 1 and 1"));

    let (status, _, _) = send(
        app(&harness, None),
        post(
            "/api/v1/enrich/batch",
            json!({ "items": [] }),
            &[("x-api-key", key.as_str())],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn unknown_data_type_is_unprocessable() {
    let harness = TestHarness::builder().build();
    let key = register(&harness, "a@example.com").await;

    let (status, _, body) = send(
        app(&harness, None),
        post(
            "/api/v1/enrich",
            json!({ "raw_data": "Acme", "data_type": "vehicle" }),
            &[("x-api-key", key.as_str())],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("data_type"), "{body}");
    assert_eq!(harness.search.call_count(), 0);
}

#[tokio::test]
async fn checkout_replays_on_idempotency_key() {
    let harness = TestHarness::builder().build();
    let body = json!({ "email": "a@example.com", "plan": "Pro" });
    let key = [("idempotency-key", "order-9")];

    let (status, _, first) = send(
        app(&harness, None),
        post("/api/v1/checkout", body.clone(), &key),
    )
    .await;
    let (_, _, second) = send(app(&harness, None), post("/api/v1/checkout", body, &key)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(first["checkout_url"].as_str().is_some());
    assert_eq!(first, second);
    assert_eq!(harness.payment.checkout_calls(), 1);
}

#[tokio::test]
async fn checkout_rejects_unknown_plans() {
    let harness = TestHarness::builder().build();

    let (status, _, body) = send(
        app(&harness, None),
        post(
            "/api/v1/checkout",
            json!({ "email": "a@example.com", "plan": "gold" }),
            &[],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid plan. Choose: basic, pro, or ultra");
}

fn webhook(payload: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/api/v1/webhook");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload)).unwrap()
}

#[tokio::test]
async fn webhook_is_verified_and_deduplicated() {
    let harness = TestHarness::builder().build();
    let payload = checkout_completed_event(Some("evt_1"), "a@example.com", "pro", "sub_1");

    let (status, _, body) = send(app(&harness, None), webhook(payload.clone(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Missing stripe-signature header");

    let (status, _, body) = send(app(&harness, None), webhook(payload.clone(), Some("invalid"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid signature");

    let (status, _, body) = send(app(&harness, None), webhook(payload.clone(), Some("t=1,v1=x"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success", "event": "checkout.session.completed" }));

    let (_, _, body) = send(app(&harness, None), webhook(payload, Some("t=1,v1=x"))).await;
    assert_eq!(body["status"], "ignored");
    assert_eq!(body["reason"], "duplicate_event");

    let key = harness
        .accounts
        .key_for_email("a@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(harness.accounts.record(&key).await.unwrap().unwrap().plan, Plan::Pro);
}

#[tokio::test]
async fn shutdown_cancels_in_flight_enrichment() {
    let harness = TestHarness::builder().build();
    let key = register(&harness, "a@example.com").await;
    let shutdown = CancellationToken::new();
    let app = router(AppState {
        enricher: harness.enricher.clone(),
        accounts: harness.accounts.clone(),
        checkout: harness.checkout.clone(),
        webhooks: harness.webhooks.clone(),
        store: harness.kv(),
        auth: AuthConfig::default(),
        retry_after_secs: 15,
        prometheus_render: None,
        shutdown: shutdown.clone(),
        start_time: Instant::now(),
    });
    shutdown.cancel();

    let (status, headers, body) = send(
        app,
        post("/api/v1/enrich", enrich_body(), &[("x-api-key", key.as_str())]),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(headers.get("retry-after").is_none());
    assert_eq!(body["detail"], "Service is shutting down");
}
