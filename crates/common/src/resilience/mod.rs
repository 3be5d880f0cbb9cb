//! Resilience patterns for calls to unreliable dependencies
//!
//! - **Circuit Breaker**: stops calling a dependency after repeated
//!   consecutive failures and tries it again after a cooldown
//! - **Retry Logic**: re-runs failed operations with exponential backoff and
//!   jitter
//! - **Policy**: retry wrapped around a shared breaker, so that every attempt
//!   is gated and counted by the breaker
//!
//! All three are generic over the operation's error type and take a
//! [`Clock`] so that tests can control breaker cooldowns.

pub mod circuit_breaker;
pub mod policy;
pub mod retry;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder,
    CircuitBreakerMetrics, CircuitState, Clock, ConfigError, ConfigResult, MockClock,
    ResilienceError, ResilienceResult, SystemClock,
};
pub use policy::{PolicyError, PolicyResult, ResiliencePolicy, StopOnOpenCircuit};
pub use retry::{
    BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
