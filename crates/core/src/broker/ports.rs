//! Port interfaces for the message broker client
//!
//! These traits define the boundary between the publish logic and the
//! concrete broker client. The system only orchestrates calls through them;
//! it never speaks the broker wire protocol itself.

use std::sync::Arc;

use async_trait::async_trait;
use dispatch_domain::{BrokerConfig, OutboundBatch, Result};

/// Publishing half of a broker session
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Establish the producer's connection to the cluster
    async fn connect(&self) -> Result<()>;

    /// Flush pending work and release the connection
    async fn disconnect(&self) -> Result<()>;

    /// Publish every message of `batch` to `batch.topic`, in order
    async fn send(&self, batch: &OutboundBatch) -> Result<()>;
}

/// Consuming half of a broker session
///
/// Held for lifecycle symmetry; nothing reads from it yet.
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Consumer group this consumer joins
    fn group_id(&self) -> &str;

    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}

/// Producer and consumer created together from one client configuration
#[derive(Clone)]
pub struct BrokerSession {
    pub producer: Arc<dyn MessageProducer>,
    pub consumer: Arc<dyn MessageConsumer>,
}

/// Factory for broker sessions
pub trait BrokerClient: Send + Sync {
    /// Build an unconnected producer/consumer pair
    fn create_session(&self, config: &BrokerConfig, group_id: &str) -> Result<BrokerSession>;
}
