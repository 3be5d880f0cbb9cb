//! Resilience policy for broker sends
//!
//! Up to 20 attempts with exponential backoff (128 ms doubling, capped at
//! 30 s, full jitter), each gated by a breaker that opens after 5
//! consecutive failures and tries again after 2 s. One policy instance is
//! shared by every send for the lifetime of the service.

use std::time::Duration;

use dispatch_common::resilience::{
    CircuitBreakerConfig, Clock, ConfigError, ResiliencePolicy, RetryConfig, SystemClock,
};
use dispatch_domain::constants::{
    BREAKER_FAILURE_THRESHOLD, BREAKER_HALF_OPEN_AFTER_MS, PUBLISH_BACKOFF_FACTOR,
    PUBLISH_BACKOFF_INITIAL_MS, PUBLISH_BACKOFF_MAX_MS, PUBLISH_MAX_ATTEMPTS,
};
use dispatch_domain::{DispatchError, Result};

pub fn publish_retry_config() -> Result<RetryConfig> {
    RetryConfig::builder()
        .max_attempts(PUBLISH_MAX_ATTEMPTS)
        .exponential_backoff(
            Duration::from_millis(PUBLISH_BACKOFF_INITIAL_MS),
            PUBLISH_BACKOFF_FACTOR,
            Duration::from_millis(PUBLISH_BACKOFF_MAX_MS),
        )
        .full_jitter()
        .build()
        .map_err(config_error)
}

pub fn publish_breaker_config() -> Result<CircuitBreakerConfig> {
    CircuitBreakerConfig::builder()
        .failure_threshold(BREAKER_FAILURE_THRESHOLD)
        .success_threshold(1)
        .half_open_after(Duration::from_millis(BREAKER_HALF_OPEN_AFTER_MS))
        .half_open_max_calls(1)
        .build()
        .map_err(config_error)
}

/// Publish policy on the system clock
pub fn publish_policy() -> Result<ResiliencePolicy<SystemClock>> {
    publish_policy_with_clock(SystemClock)
}

/// Publish policy whose breaker cooldown is measured by `clock`
pub fn publish_policy_with_clock<C: Clock>(clock: C) -> Result<ResiliencePolicy<C>> {
    ResiliencePolicy::with_clock(publish_retry_config()?, publish_breaker_config()?, clock)
        .map_err(config_error)
}

fn config_error(err: ConfigError) -> DispatchError {
    DispatchError::Config(err.to_string())
}
