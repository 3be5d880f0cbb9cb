//! Error types used throughout the application

use std::time::Duration;

use dispatch_common::error::{ErrorClassification, ErrorSeverity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DeadLetterOutcome;

/// Main error type for dispatch
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Circuit open: {0}")]
    CircuitOpen(String),

    /// A publish that the resilience policy gave up on
    #[error("Publish to '{topic}' failed after {attempts} attempt(s): {reason}")]
    PublishFailed {
        topic: String,
        attempts: u32,
        reason: String,
        dead_letter: DeadLetterOutcome,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl ErrorClassification for DispatchError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Broker(_) | Self::Timeout(_) | Self::CircuitOpen(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout(_) | Self::CircuitOpen(_) | Self::NotConnected(_) => ErrorSeverity::Warning,
            Self::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;
