//! Publisher - resilient batch publishing with dead-letter fallback

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dispatch_common::resilience::{
    CircuitBreakerMetrics, CircuitState, Clock, ResiliencePolicy, SystemClock,
};
use dispatch_domain::{DispatchError, OutboundBatch, PublishReceipt, Result};
use serde::Serialize;
use tokio::time;
use tracing::{debug, error, instrument, warn};

use super::codec;
use super::dead_letter::DeadLetterForwarder;
use super::policy::publish_policy;
use crate::broker::ports::MessageProducer;
use crate::connection::ConnectionManager;

/// Publishes batches through the shared resilience policy
///
/// A send that the policy gives up on is reported to the dead-letter topic
/// once and surfaced to the caller as [`DispatchError::PublishFailed`].
pub struct Publisher<C: Clock = SystemClock> {
    connection: Arc<ConnectionManager>,
    policy: ResiliencePolicy<C>,
    dead_letter: DeadLetterForwarder,
    request_timeout: Duration,
}

impl Publisher<SystemClock> {
    /// Publisher with the standard publish policy
    pub fn new(connection: Arc<ConnectionManager>) -> Result<Self> {
        Ok(Self::with_policy(connection, publish_policy()?))
    }
}

impl<C: Clock> Publisher<C> {
    pub fn with_policy(connection: Arc<ConnectionManager>, policy: ResiliencePolicy<C>) -> Self {
        let request_timeout = connection.config().request_timeout();
        let dead_letter = DeadLetterForwarder::new(Arc::clone(&connection));
        Self { connection, policy, dead_letter, request_timeout }
    }

    /// Serialize `messages` and publish them to `topic`
    ///
    /// # Errors
    /// - `Serialization` if a payload cannot be encoded; nothing is sent
    /// - `NotConnected` if the connection manager has no producer
    /// - `PublishFailed` once the policy gives up; the failure has already
    ///   been forwarded to the dead-letter topic
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    pub async fn send<T: Serialize>(&self, messages: &[T], topic: &str) -> Result<PublishReceipt> {
        let batch = codec::encode_batch(topic, messages).map_err(|err| {
            warn!(topic, error = %err, "publish_rejected");
            err
        })?;
        if batch.is_empty() {
            debug!("empty batch, nothing to publish");
            return Ok(self.receipt(&batch, 0));
        }

        let producer = self.connection.producer().await.map_err(|err| {
            warn!(topic, error = %err, "publish_rejected");
            err
        })?;
        let attempts = AtomicU32::new(0);

        let result = {
            let producer = producer.as_ref();
            let batch = &batch;
            let attempts = &attempts;
            let request_timeout = self.request_timeout;
            self.policy
                .execute(move || {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    send_bounded(producer, batch, request_timeout)
                })
                .await
        };

        match result {
            Ok(()) => {
                let receipt = self.receipt(&batch, attempts.load(Ordering::Relaxed));
                debug!(attempts = receipt.attempts, "batch published");
                Ok(receipt)
            }
            Err(err) => {
                let attempts = err.attempts();
                let reason = err.to_string();
                error!(topic, attempts, error = %reason, "publish_failed");

                let dead_letter = self.dead_letter.forward(&reason, topic).await;
                Err(DispatchError::PublishFailed {
                    topic: topic.to_string(),
                    attempts,
                    reason,
                    dead_letter,
                })
            }
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.policy.circuit_state()
    }

    pub fn breaker_metrics(&self) -> CircuitBreakerMetrics {
        self.policy.breaker_metrics()
    }

    pub fn policy(&self) -> &ResiliencePolicy<C> {
        &self.policy
    }

    fn receipt(&self, batch: &OutboundBatch, attempts: u32) -> PublishReceipt {
        PublishReceipt {
            topic: batch.topic.clone(),
            message_count: batch.len(),
            attempts,
            published_at: Utc::now(),
        }
    }
}

async fn send_bounded(
    producer: &dyn MessageProducer,
    batch: &OutboundBatch,
    request_timeout: Duration,
) -> Result<()> {
    time::timeout(request_timeout, producer.send(batch)).await.map_err(|_| {
        DispatchError::Timeout(format!(
            "send to '{}' exceeded {} ms",
            batch.topic,
            request_timeout.as_millis()
        ))
    })?
}
