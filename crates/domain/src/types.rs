//! Data types that flow through the publish path

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One payload encoded as JSON text, in the shape handed to the broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedMessage {
    pub value: String,
}

impl SerializedMessage {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

/// Encoded messages bound for a single topic, in caller order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundBatch {
    pub topic: String,
    pub messages: Vec<SerializedMessage>,
}

impl OutboundBatch {
    pub fn new(topic: impl Into<String>, messages: Vec<SerializedMessage>) -> Self {
        Self { topic: topic.into(), messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Failure record published to the dead-letter topic
///
/// Carries the original topic and the error text only; payloads are not
/// retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub topic: String,
    pub error: String,
}

impl DeadLetterRecord {
    pub fn new(topic: impl Into<String>, error: impl fmt::Display) -> Self {
        Self { topic: topic.into(), error: error.to_string() }
    }
}

/// What happened to the dead-letter record of a failed publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeadLetterOutcome {
    /// The record was accepted by the broker
    Forwarded,
    /// The record could not be published and was dropped
    Dropped(String),
}

impl DeadLetterOutcome {
    pub fn is_forwarded(&self) -> bool {
        matches!(self, Self::Forwarded)
    }
}

/// Acknowledgement of a successful publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub topic: String,
    pub message_count: usize,
    /// Broker send attempts used, 0 for an empty batch
    pub attempts: u32,
    pub published_at: DateTime<Utc>,
}

/// Connectivity of the producer/consumer pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}
