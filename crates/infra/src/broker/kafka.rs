//! Kafka adapter for the broker port
//!
//! Producer and consumer are built from one [`BrokerConfig`]. Creating them
//! does not touch the network; `connect` fetches cluster metadata within the
//! connection timeout so an unreachable cluster fails fast.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dispatch_core::broker::ports::{BrokerClient, BrokerSession, MessageConsumer, MessageProducer};
use dispatch_domain::{BrokerConfig, DispatchError, LogLevel, OutboundBatch, Result};
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use tracing::{debug, info, warn};

/// Builds rdkafka producer/consumer sessions
#[derive(Debug, Clone, Default)]
pub struct KafkaBroker;

impl KafkaBroker {
    pub fn new() -> Self {
        Self
    }
}

impl BrokerClient for KafkaBroker {
    fn create_session(&self, config: &BrokerConfig, group_id: &str) -> Result<BrokerSession> {
        let base = client_config(config);

        let producer: FutureProducer = base
            .clone()
            .set("acks", "all")
            .set("request.timeout.ms", config.request_timeout_ms.to_string())
            .set("message.timeout.ms", config.request_timeout_ms.to_string())
            .create()
            .map_err(|e| DispatchError::Config(format!("Failed to create Kafka producer: {e}")))?;

        let consumer: StreamConsumer = base
            .clone()
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .create()
            .map_err(|e| DispatchError::Config(format!("Failed to create Kafka consumer: {e}")))?;

        debug!(
            client_id = %config.client_id,
            brokers = %config.bootstrap_servers(),
            group_id,
            "kafka session created"
        );

        Ok(BrokerSession {
            producer: Arc::new(KafkaProducer {
                producer,
                connect_timeout: config.connection_timeout(),
                request_timeout: config.request_timeout(),
            }),
            consumer: Arc::new(KafkaConsumer {
                consumer: Arc::new(consumer),
                group_id: group_id.to_string(),
                connect_timeout: config.connection_timeout(),
            }),
        })
    }
}

/// Settings shared by producer and consumer
fn client_config(config: &BrokerConfig) -> ClientConfig {
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", config.bootstrap_servers())
        .set("client.id", &config.client_id)
        .set("socket.connection.setup.timeout.ms", config.authentication_timeout_ms.to_string())
        .set_log_level(rdkafka_log_level(config.log_level));
    client
}

fn rdkafka_log_level(level: LogLevel) -> RDKafkaLogLevel {
    match level {
        LogLevel::Error => RDKafkaLogLevel::Error,
        LogLevel::Warn => RDKafkaLogLevel::Warning,
        LogLevel::Info => RDKafkaLogLevel::Info,
        LogLevel::Debug | LogLevel::Trace => RDKafkaLogLevel::Debug,
    }
}

/// Run a blocking librdkafka call off the async workers
async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| DispatchError::Internal(format!("kafka worker task failed: {e}")))?
}

struct KafkaProducer {
    producer: FutureProducer,
    connect_timeout: Duration,
    request_timeout: Duration,
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn connect(&self) -> Result<()> {
        let producer = self.producer.clone();
        let timeout = self.connect_timeout;
        let metadata = blocking(move || {
            producer
                .client()
                .fetch_metadata(None, timeout)
                .map(|metadata| metadata.brokers().len())
                .map_err(|e| DispatchError::Connection(format!("kafka producer connect: {e}")))
        })
        .await?;

        info!(brokers = metadata, "kafka producer connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let producer = self.producer.clone();
        let timeout = self.request_timeout;
        blocking(move || {
            producer
                .flush(timeout)
                .map_err(|e| DispatchError::Broker(format!("kafka producer flush: {e}")))
        })
        .await
    }

    async fn send(&self, batch: &OutboundBatch) -> Result<()> {
        for message in &batch.messages {
            let record = FutureRecord::<(), str>::to(&batch.topic).payload(message.value.as_str());

            if let Err((err, _)) = self.producer.send(record, self.request_timeout).await {
                warn!(topic = %batch.topic, error = %err, "kafka delivery failed");
                return Err(DispatchError::Broker(err.to_string()));
            }
        }
        Ok(())
    }
}

struct KafkaConsumer {
    consumer: Arc<StreamConsumer>,
    group_id: String,
    connect_timeout: Duration,
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    async fn connect(&self) -> Result<()> {
        let consumer = Arc::clone(&self.consumer);
        let timeout = self.connect_timeout;
        blocking(move || {
            consumer
                .fetch_metadata(None, timeout)
                .map(drop)
                .map_err(|e| DispatchError::Connection(format!("kafka consumer connect: {e}")))
        })
        .await?;

        info!(group_id = %self.group_id, "kafka consumer connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.consumer.unsubscribe();
        Ok(())
    }
}
