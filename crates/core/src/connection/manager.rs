//! Connection manager - owns the broker session for the service lifetime

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dispatch_common::lifecycle::{LifecycleError, ManagerLifecycle, ManagerStatus, SharedState};
use dispatch_domain::constants::CONSUMER_GROUP_ID;
use dispatch_domain::{BrokerConfig, ConnectionStatus, DispatchError, Result};
use tokio::time;
use tracing::{debug, info, warn};

use crate::broker::ports::{BrokerClient, BrokerSession, MessageConsumer, MessageProducer};

/// Connected producer/consumer pair
#[derive(Clone)]
struct ConnectionHandle {
    producer: Arc<dyn MessageProducer>,
    consumer: Arc<dyn MessageConsumer>,
}

/// Either both handles exist or neither does
enum ConnectionState {
    Disconnected,
    Connected(ConnectionHandle),
}

/// Owns creation, connection and teardown of the producer and consumer
///
/// Transitions are serialized through an async lock, so a `connect` racing a
/// `disconnect` always leaves the manager fully connected or fully
/// disconnected.
pub struct ConnectionManager {
    client: Arc<dyn BrokerClient>,
    config: BrokerConfig,
    state: SharedState<ConnectionState>,
    ever_connected: AtomicBool,
}

impl ConnectionManager {
    /// Create a manager; nothing is connected until [`connect`](Self::connect)
    pub fn new(client: Arc<dyn BrokerClient>, config: BrokerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            config,
            state: SharedState::new(ConnectionState::Disconnected, "broker_connection"),
            ever_connected: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Create a session and connect producer then consumer
    ///
    /// Bounded by the connection timeout. On any failure the partially
    /// opened session is torn down, within the same timeout, and the manager
    /// stays disconnected.
    /// Calling this while connected is a no-op.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if matches!(*state, ConnectionState::Connected(_)) {
            warn!("connect called while already connected, keeping existing session");
            return Ok(());
        }

        let session = self.client.create_session(&self.config, CONSUMER_GROUP_ID)?;
        let timeout = self.config.connection_timeout();

        match time::timeout(timeout, open_session(&session)).await {
            Ok(Ok(())) => {
                *state = ConnectionState::Connected(ConnectionHandle {
                    producer: session.producer,
                    consumer: session.consumer,
                });
                self.ever_connected.store(true, Ordering::Release);
                info!(
                    client_id = %self.config.client_id,
                    brokers = %self.config.bootstrap_servers(),
                    group_id = CONSUMER_GROUP_ID,
                    "broker_connected"
                );
                Ok(())
            }
            Ok(Err(err)) => {
                warn!(error = %err, "broker connect failed");
                abandon_session(&session, timeout).await;
                Err(err)
            }
            Err(_) => {
                warn!(timeout_ms = self.config.connection_timeout_ms, "broker connect timed out");
                abandon_session(&session, timeout).await;
                Err(DispatchError::Timeout(format!(
                    "broker unreachable within {} ms ({})",
                    self.config.connection_timeout_ms,
                    self.config.bootstrap_servers()
                )))
            }
        }
    }

    /// Disconnect consumer then producer
    ///
    /// Safe to call when never connected. The manager always ends up
    /// disconnected; the first teardown error, if any, is returned.
    pub async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let handle = match std::mem::replace(&mut *state, ConnectionState::Disconnected) {
            ConnectionState::Disconnected => {
                debug!("disconnect called while not connected");
                return Ok(());
            }
            ConnectionState::Connected(handle) => handle,
        };

        let consumer_result = handle.consumer.disconnect().await;
        if let Err(err) = &consumer_result {
            warn!(error = %err, "consumer disconnect failed");
        }

        let producer_result = handle.producer.disconnect().await;
        if let Err(err) = &producer_result {
            warn!(error = %err, "producer disconnect failed");
        }

        info!(client_id = %self.config.client_id, "broker_disconnected");
        consumer_result.and(producer_result)
    }

    /// True once a producer handle exists; no liveness check is made
    pub async fn is_connected(&self) -> bool {
        self.state.read_with(|s| matches!(s, ConnectionState::Connected(_))).await
    }

    pub async fn status(&self) -> ConnectionStatus {
        if self.is_connected().await {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    /// Producer of the current session
    pub async fn producer(&self) -> Result<Arc<dyn MessageProducer>> {
        self.state
            .read_with(|s| match s {
                ConnectionState::Connected(handle) => Ok(Arc::clone(&handle.producer)),
                ConnectionState::Disconnected => Err(DispatchError::NotConnected(
                    "broker producer is not connected".to_string(),
                )),
            })
            .await
    }
}

async fn open_session(session: &BrokerSession) -> Result<()> {
    session.producer.connect().await?;
    session.consumer.connect().await
}

async fn abandon_session(session: &BrokerSession, timeout: Duration) {
    let teardown = async {
        if let Err(err) = session.consumer.disconnect().await {
            debug!(error = %err, "ignoring consumer teardown error after failed connect");
        }
        if let Err(err) = session.producer.disconnect().await {
            debug!(error = %err, "ignoring producer teardown error after failed connect");
        }
    };

    if time::timeout(timeout, teardown).await.is_err() {
        warn!(timeout_ms = timeout.as_millis() as u64, "session teardown timed out, dropping it");
    }
}

#[async_trait]
impl ManagerLifecycle for ConnectionManager {
    async fn initialize(&self) -> std::result::Result<(), LifecycleError> {
        self.connect().await.map_err(Into::into)
    }

    async fn shutdown(&self) -> std::result::Result<(), LifecycleError> {
        self.disconnect().await.map_err(Into::into)
    }

    fn name(&self) -> &str {
        "connection_manager"
    }

    async fn status(&self) -> ManagerStatus {
        match ConnectionManager::status(self).await {
            ConnectionStatus::Connected => ManagerStatus::Running,
            ConnectionStatus::Disconnected if self.ever_connected.load(Ordering::Acquire) => {
                ManagerStatus::Shutdown
            }
            ConnectionStatus::Disconnected => ManagerStatus::Created,
        }
    }
}
