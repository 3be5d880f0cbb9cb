//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Broker routing
pub const DEAD_LETTER_TOPIC: &str = "dlx-logs";
pub const CONSUMER_GROUP_ID: &str = "reporting-consumer-v1";

// Broker client defaults
pub const DEFAULT_CLIENT_ID: &str = "reporting-client";
pub const DEFAULT_BROKER: &str = "kafka:9092";
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_AUTHENTICATION_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 25_000;

// Publish resilience policy
pub const PUBLISH_MAX_ATTEMPTS: u32 = 20;
pub const PUBLISH_BACKOFF_INITIAL_MS: u64 = 128;
pub const PUBLISH_BACKOFF_FACTOR: f64 = 2.0;
pub const PUBLISH_BACKOFF_MAX_MS: u64 = 30_000;
pub const BREAKER_FAILURE_THRESHOLD: u64 = 5;
pub const BREAKER_HALF_OPEN_AFTER_MS: u64 = 2_000;
