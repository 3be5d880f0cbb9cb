//! Configuration structures
//!
//! Every field has a default, so a partial JSON or TOML document only needs
//! to name what it overrides.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTHENTICATION_TIMEOUT_MS, DEFAULT_BROKER, DEFAULT_CLIENT_ID,
    DEFAULT_CONNECTION_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::errors::{DispatchError, Result};

/// Top-level service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub broker: BrokerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.broker.validate()
    }
}

/// Broker client settings; immutable once the connection manager is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub client_id: String,
    pub brokers: Vec<String>,
    pub connection_timeout_ms: u64,
    pub authentication_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Verbosity of the broker client's own logging
    pub log_level: LogLevel,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            brokers: vec![DEFAULT_BROKER.to_string()],
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            authentication_timeout_ms: DEFAULT_AUTHENTICATION_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            log_level: LogLevel::Error,
        }
    }
}

impl BrokerConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn authentication_timeout(&self) -> Duration {
        Duration::from_millis(self.authentication_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Broker list in `host:port,host:port` form
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    /// Reject settings no broker client can work with
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(DispatchError::Config("client_id must not be empty".to_string()));
        }

        if self.brokers.is_empty() || self.brokers.iter().any(|b| b.trim().is_empty()) {
            return Err(DispatchError::Config(
                "brokers must list at least one non-empty address".to_string(),
            ));
        }

        for (name, value) in [
            ("connection_timeout_ms", self.connection_timeout_ms),
            ("authentication_timeout_ms", self.authentication_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(DispatchError::Config(format!("{name} must be greater than 0")));
            }
        }

        Ok(())
    }
}

/// Service log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: LogLevel::Info, json: false }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(DispatchError::Config(format!("Unknown log level: {other}"))),
        }
    }
}
