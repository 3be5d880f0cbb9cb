//! Retry wrapped around a circuit breaker
//!
//! [`ResiliencePolicy`] runs every attempt of a retry sequence through one
//! shared [`CircuitBreaker`]. Failed attempts feed the breaker's consecutive
//! failure count, and once the breaker opens the sequence stops immediately
//! instead of sleeping through rejected attempts.

use std::future::Future;

use thiserror::Error;
use tracing::warn;

use super::circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState, Clock,
    ConfigResult, ResilienceError, SystemClock,
};
use super::retry::{RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy};

/// Failure of a policy-guarded operation
#[derive(Debug, Error)]
pub enum PolicyError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The breaker rejected an attempt; `attempts` counts the operation
    /// invocations made before the rejection
    #[error("circuit open after {attempts} attempt(s)")]
    CircuitOpen { attempts: u32 },

    /// Every allowed attempt ran and failed
    #[error("gave up after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },
}

impl<E> PolicyError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Number of times the operation was actually invoked
    pub fn attempts(&self) -> u32 {
        match self {
            Self::CircuitOpen { attempts } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Result type for policy-guarded operations
pub type PolicyResult<T, E> = Result<T, PolicyError<E>>;

/// Retries every failure except a rejection by the breaker
#[derive(Debug, Clone, Copy, Default)]
pub struct StopOnOpenCircuit;

impl<E> RetryPolicy<ResilienceError<E>> for StopOnOpenCircuit
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn should_retry(&self, error: &ResilienceError<E>, _attempt: u32) -> RetryDecision {
        match error {
            ResilienceError::CircuitOpen => RetryDecision::Stop,
            ResilienceError::OperationFailed { .. } => RetryDecision::Retry,
        }
    }
}

/// Retry-around-breaker policy shared by every caller of one dependency
///
/// Cloning is cheap and clones share the breaker state.
#[derive(Debug, Clone)]
pub struct ResiliencePolicy<C: Clock = SystemClock> {
    retry: RetryExecutor<StopOnOpenCircuit>,
    breaker: CircuitBreaker<C>,
}

impl ResiliencePolicy<SystemClock> {
    /// Build a policy on the system clock
    pub fn new(retry: RetryConfig, breaker: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(retry, breaker, SystemClock)
    }
}

impl<C: Clock> ResiliencePolicy<C> {
    /// Build a policy whose breaker cooldown is measured by `clock`
    pub fn with_clock(
        retry: RetryConfig,
        breaker: CircuitBreakerConfig,
        clock: C,
    ) -> ConfigResult<Self> {
        retry.validate()?;
        let breaker = CircuitBreaker::with_clock(breaker, clock)?;
        Ok(Self { retry: RetryExecutor::new(retry, StopOnOpenCircuit), breaker })
    }

    /// Run `operation` under the policy
    ///
    /// The operation is invoked at most `max_attempts` times and never while
    /// the breaker rejects calls.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> PolicyResult<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let breaker = &self.breaker;
        let operation = &operation;

        let result = self.retry.execute(move || breaker.execute(move || operation())).await;

        result.map_err(|err| match err {
            RetryError::AttemptsExhausted { attempts, source: ResilienceError::CircuitOpen }
            | RetryError::NonRetryable { attempts, source: ResilienceError::CircuitOpen } => {
                let invoked = attempts.saturating_sub(1);
                warn!(attempts = invoked, "circuit open, attempt rejected");
                PolicyError::CircuitOpen { attempts: invoked }
            }
            RetryError::AttemptsExhausted {
                attempts,
                source: ResilienceError::OperationFailed { source },
            }
            | RetryError::NonRetryable {
                attempts,
                source: ResilienceError::OperationFailed { source },
            } => PolicyError::Exhausted { attempts, source },
        })
    }

    /// Current breaker state
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.get_state()
    }

    /// Breaker metrics snapshot
    pub fn breaker_metrics(&self) -> CircuitBreakerMetrics {
        self.breaker.metrics()
    }

    /// The breaker shared by every clone of this policy
    pub fn breaker(&self) -> &CircuitBreaker<C> {
        &self.breaker
    }

    /// Retry configuration
    pub fn retry_config(&self) -> &RetryConfig {
        self.retry.config()
    }
}
