// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use enrich_billing::{AccountStore, CheckoutService, PlanPrices, WebhookHandler};
use enrich_config::EnrichConfig;
use enrich_core::{EnrichError, KvStore, ModelProvider, PaymentProvider, SearchProvider};
use enrich_pipeline::Enricher;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub enricher: Arc<Enricher>,
    pub accounts: AccountStore,
    pub checkout: Arc<CheckoutService>,
    pub webhooks: Arc<WebhookHandler>,
    pub store: Arc<dyn KvStore>,
    pub auth: AuthConfig,
    /// Hint sent in `Retry-After` on 503 responses.
    pub retry_after_secs: u64,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
    /// Parent of every request's cancellation token.
    pub shutdown: CancellationToken,
    pub start_time: Instant,
}

impl AppState {
    /// Wires the services onto the given providers and store.
    pub fn new(
        config: &EnrichConfig,
        store: Arc<dyn KvStore>,
        search: Arc<dyn SearchProvider>,
        model: Arc<dyn ModelProvider>,
        payment: Arc<dyn PaymentProvider>,
        shutdown: CancellationToken,
    ) -> Self {
        let accounts = AccountStore::new(store.clone());
        let checkout = CheckoutService::new(
            payment.clone(),
            store.clone(),
            PlanPrices::from_config(&config.billing),
            &config.server.base_url,
            Duration::from_secs(config.billing.checkout_ttl_secs),
        );
        let webhooks = WebhookHandler::new(
            payment,
            store.clone(),
            accounts.clone(),
            Duration::from_secs(config.billing.webhook_event_ttl_secs),
        );
        Self {
            enricher: Arc::new(Enricher::from_config(config, search, model)),
            accounts,
            checkout: Arc::new(checkout),
            webhooks: Arc::new(webhooks),
            store,
            auth: AuthConfig {
                rapidapi_proxy_secret: enrich_config::resolve_secret(
                    config.server.rapidapi_proxy_secret.as_deref(),
                    "RAPIDAPI_PROXY_SECRET",
                ),
            },
            retry_after_secs: config.enrichment.retry_after_secs,
            prometheus_render: None,
            shutdown,
            start_time: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, render: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.prometheus_render = Some(render);
        self
    }
}

/// Builds the application router.
///
/// - GET /health, GET /metrics
/// - POST /api/v1/register, /api/v1/checkout, /api/v1/webhook
/// - POST /api/v1/enrich, /api/v1/enrich/batch (with auth)
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/api/v1/register", post(handlers::post_register))
        .route("/api/v1/checkout", post(handlers::post_checkout))
        .route("/api/v1/webhook", post(handlers::post_webhook))
        .with_state(state.clone());

    let enrich_routes = Router::new()
        .route("/api/v1/enrich", post(handlers::post_enrich))
        .route("/api/v1/enrich/batch", post(handlers::post_enrich_batch))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(enrich_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `shutdown` is cancelled.
pub async fn serve(
    host: &str,
    port: u16,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), EnrichError> {
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EnrichError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("enrichment API listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| EnrichError::Internal(format!("server error: {e}")))
}
