#![deny(unused)]
//! Helpdesk Gateway - Multi-Modal Support Request Gateway
//!
//! Fans a support request out to the QA, Vision, and Speech backends with
//! bounded concurrency, per-backend timeout/retry policy, and deterministic
//! aggregation of partial results.

use std::sync::Arc;

use helpdesk_core::config::AppConfig;
use helpdesk_dispatch::{DispatchPolicy, Dispatcher, ResponseAggregator};
use helpdesk_gateway::{configure_tracing, GatewayConfig, GatewayServer, TracingObserver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    configure_tracing(config.gateway.json_logs)?;

    tracing::info!("Starting helpdesk gateway v{}", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // Backend capability clients
    // =========================================================================
    let clients = helpdesk_backends::clients_from_config(&config.backends);
    tracing::info!(backends = clients.len(), "Backend clients initialized");

    // =========================================================================
    // Dispatch and aggregation
    // =========================================================================
    let dispatcher = Arc::new(Dispatcher::new(
        clients,
        DispatchPolicy::from_settings(&config.dispatch),
    ));
    let aggregator = ResponseAggregator::from_settings(&config.aggregator);

    // =========================================================================
    // External collaborators
    // =========================================================================
    let identity: Arc<dyn helpdesk_core::traits::IdentityProvider> =
        helpdesk_gateway::provider_from_config(&config.identity)?.into();
    tracing::info!(mode = %config.identity.mode, "Identity provider initialized");

    let observer = Arc::new(TracingObserver::new());

    // =========================================================================
    // HTTP server
    // =========================================================================
    let gateway_config = GatewayConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        enable_cors: config.gateway.enable_cors,
        enable_tracing: config.gateway.enable_tracing,
    };

    let mut server = GatewayServer::new(gateway_config, identity, dispatcher, aggregator, observer);

    if config.gateway.enable_metrics {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))?;
        server = server.with_metrics(handle);
        tracing::info!("Prometheus metrics enabled at /metrics");
    }

    server.run().await?;

    Ok(())
}
