//! Dead-letter forwarding
//!
//! Failed publishes are reported to the `dlx-logs` topic as
//! `{"topic": <original topic>, "error": <error text>}`. Forwarding is
//! best-effort and at-most-once: it is not retried, never gated by the
//! publish breaker, and its own failures are logged and dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dispatch_domain::constants::DEAD_LETTER_TOPIC;
use dispatch_domain::{DeadLetterOutcome, DeadLetterRecord, DispatchError, Result};
use tokio::time;
use tracing::{error, warn};

use super::codec;
use crate::connection::ConnectionManager;

pub struct DeadLetterForwarder {
    connection: Arc<ConnectionManager>,
    request_timeout: Duration,
}

impl DeadLetterForwarder {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        let request_timeout = connection.config().request_timeout();
        Self { connection, request_timeout }
    }

    /// Publish one failure record for `original_topic`
    ///
    /// Never returns an error; the outcome says whether the record reached
    /// the broker.
    pub async fn forward(&self, error: impl fmt::Display, original_topic: &str) -> DeadLetterOutcome {
        let record = DeadLetterRecord::new(original_topic, error);

        match self.publish(&record).await {
            Ok(()) => {
                warn!(
                    topic = %record.topic,
                    dead_letter_topic = DEAD_LETTER_TOPIC,
                    error = %record.error,
                    "dead_letter_forwarded"
                );
                DeadLetterOutcome::Forwarded
            }
            Err(err) => {
                error!(
                    topic = %record.topic,
                    dead_letter_topic = DEAD_LETTER_TOPIC,
                    original_error = %record.error,
                    error = %err,
                    "dead_letter_dropped"
                );
                DeadLetterOutcome::Dropped(err.to_string())
            }
        }
    }

    async fn publish(&self, record: &DeadLetterRecord) -> Result<()> {
        let batch = codec::encode_dead_letter(record)?;
        let producer = self.connection.producer().await?;

        time::timeout(self.request_timeout, producer.send(&batch)).await.map_err(|_| {
            DispatchError::Timeout(format!(
                "dead-letter publish exceeded {} ms",
                self.request_timeout.as_millis()
            ))
        })?
    }
}
