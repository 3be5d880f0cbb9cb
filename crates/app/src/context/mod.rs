//! Application context - dependency injection container

use std::sync::Arc;

use dispatch_common::error::CommonError;
use dispatch_common::lifecycle::{ManagerController, ManagerLifecycle, ManagerStatus};
use dispatch_common::resilience::CircuitState;
use dispatch_core::{BrokerClient, ConnectionManager, Publisher};
use dispatch_domain::{Config, ConnectionStatus, DispatchError, Result};
use tracing::{error, info};

use crate::utils::logging::error_label;

/// Application context - holds the connection manager and publisher
pub struct AppContext {
    pub config: Config,
    pub connection: Arc<ConnectionManager>,
    pub publisher: Publisher,
    controller: ManagerController,
}

impl AppContext {
    /// Wire the services and connect to the broker
    ///
    /// # Errors
    /// Fails when the configuration is invalid or the broker cannot be
    /// reached within the connection timeout.
    pub async fn bootstrap(config: Config, client: Arc<dyn BrokerClient>) -> Result<Self> {
        let context = Self::new(config, client)?;

        if let Err(err) = context.controller.initialize_all().await {
            let err = dispatch_error(err);
            error!(error = %err, label = error_label(&err), "bootstrap_failed");
            return Err(err);
        }

        info!(
            client_id = %context.config.broker.client_id,
            brokers = %context.config.broker.bootstrap_servers(),
            "dispatch_ready"
        );
        Ok(context)
    }

    /// Wire the services without connecting
    pub fn new(config: Config, client: Arc<dyn BrokerClient>) -> Result<Self> {
        config.validate()?;

        let connection = Arc::new(ConnectionManager::new(client, config.broker.clone())?);
        let publisher = Publisher::new(Arc::clone(&connection))?;

        let mut controller = ManagerController::new();
        controller.add_manager(Arc::clone(&connection) as Arc<dyn ManagerLifecycle>);

        Ok(Self { config, connection, publisher, controller })
    }

    /// Stop every managed service in reverse start order
    ///
    /// `signal` names what triggered the shutdown and is only logged.
    pub async fn shutdown(&self, signal: &str) -> Result<()> {
        info!(signal, "shutdown requested");

        self.controller.shutdown_all().await.map_err(|err| {
            let err = dispatch_error(err);
            error!(error = %err, label = error_label(&err), "shutdown_failed");
            err
        })?;

        info!("shutdown complete");
        Ok(())
    }

    pub async fn status(&self) -> ManagerStatus {
        self.controller.status().await
    }

    pub async fn connection_status(&self) -> ConnectionStatus {
        self.connection.status().await
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.publisher.circuit_state()
    }
}

/// The error a managed service failed with, when it is a `DispatchError`
fn dispatch_error(err: CommonError) -> DispatchError {
    err.downcast_source::<DispatchError>()
        .unwrap_or_else(|other| DispatchError::Internal(other.to_string()))
}
