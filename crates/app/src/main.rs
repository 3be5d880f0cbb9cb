//! Dispatch - resilient publisher for the reporting broker
//!
//! Main entry point for the service binary.

use std::sync::Arc;

use anyhow::Context;
use dispatch_app::utils::signal::shutdown_signal;
use dispatch_app::AppContext;
use dispatch_core::BrokerClient;
use dispatch_infra::{config, init_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading configuration
    let dotenv = dotenvy::dotenv();

    let config = config::load_or_default().context("failed to load configuration")?;
    init_logging(&config.logging, config.broker.log_level)
        .context("failed to initialize logging")?;

    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let context = AppContext::bootstrap(config, broker_client())
        .await
        .context("failed to start dispatch")?;

    let signal = shutdown_signal().await;
    context.shutdown(signal).await.context("shutdown did not complete cleanly")?;

    Ok(())
}

#[cfg(feature = "kafka")]
fn broker_client() -> Arc<dyn BrokerClient> {
    tracing::info!("using kafka broker client");
    Arc::new(dispatch_infra::KafkaBroker::new())
}

#[cfg(not(feature = "kafka"))]
fn broker_client() -> Arc<dyn BrokerClient> {
    tracing::warn!("built without the kafka feature, using the in-memory broker");
    Arc::new(dispatch_infra::InMemoryBroker::new())
}
