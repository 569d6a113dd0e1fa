// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `enrich serve` command implementation.
//!
//! Opens the key-value store, builds the search, model, and payment
//! adapters, installs the Prometheus recorder, and serves the HTTP API until
//! SIGINT or SIGTERM. A background task purges expired keys.

use std::sync::Arc;
use std::time::Duration;

use enrich_anthropic::AnthropicProvider;
use enrich_billing::StripeClient;
use enrich_config::EnrichConfig;
use enrich_core::{EnrichError, HealthStatus, KvStore, PluginAdapter};
use enrich_gateway::AppState;
use enrich_prometheus::PrometheusAdapter;
use enrich_search::SerperClient;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::shutdown;

/// Runs the `enrich serve` command.
pub async fn run_serve(config: EnrichConfig) -> Result<(), EnrichError> {
    init_tracing(&config.server.log_level);

    let store = enrich_store::open_store(&config.storage).await?;
    let search = Arc::new(SerperClient::new(&config.search)?);
    let model = Arc::new(AnthropicProvider::new(&config.anthropic)?);
    let payment = Arc::new(StripeClient::new(&config.billing)?);

    let adapters: [&dyn PluginAdapter; 3] = [search.as_ref(), model.as_ref(), payment.as_ref()];
    for adapter in adapters {
        log_adapter_health(adapter).await;
    }

    let shutdown = shutdown::install_signal_handler();

    let mut state = AppState::new(
        &config,
        store.clone(),
        search.clone(),
        model.clone(),
        payment.clone(),
        shutdown.clone(),
    );
    match PrometheusAdapter::new() {
        Ok(prometheus) => {
            state = state.with_metrics(Arc::new(move || prometheus.render()));
        }
        Err(e) => warn!(error = %e, "metrics disabled"),
    }

    let sweeper = tokio::spawn(sweep_expired(
        store.clone(),
        Duration::from_secs(config.storage.sweep_interval_secs),
        shutdown.clone(),
    ));

    let result = enrich_gateway::serve(
        &config.server.host,
        config.server.port,
        state,
        shutdown.clone(),
    )
    .await;

    // The server may have failed without a signal; stop the sweeper either way.
    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "expiry sweeper task failed");
    }
    for adapter in adapters {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }
    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "store shutdown failed");
    }

    info!("enrichment API stopped");
    result
}

async fn log_adapter_health(adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => info!(adapter = adapter.name(), "adapter ready"),
        Ok(HealthStatus::Degraded(reason)) => {
            warn!(adapter = adapter.name(), reason = %reason, "adapter degraded")
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(adapter = adapter.name(), reason = %reason, "adapter not configured")
        }
        Err(e) => warn!(adapter = adapter.name(), error = %e, "adapter health check failed"),
    }
}

/// Purges expired keys every `interval` until `cancel` fires.
pub(crate) async fn sweep_expired(
    store: Arc<dyn KvStore>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("expiry sweeper stopping");
                return;
            }
            _ = ticker.tick() => {
                match store.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => debug!(purged, "purged expired keys"),
                    Err(e) => warn!(error = %e, "failed to purge expired keys"),
                }
            }
        }
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "enrich={log_level},enrich_gateway={log_level},enrich_pipeline={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
