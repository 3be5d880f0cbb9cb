//! Integration tests for the resilience module
//!
//! Drives the retry-around-breaker policy through full failure and recovery
//! cycles on a paused tokio clock.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dispatch_common::resilience::{
    CircuitBreakerConfig, CircuitState, MockClock, PolicyError, ResiliencePolicy, RetryConfig,
};

#[derive(Debug, Clone)]
struct TestError {
    message: String,
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TestError {}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn twenty_attempt_policy(clock: MockClock) -> ResiliencePolicy<MockClock> {
    let retry = RetryConfig::builder()
        .max_attempts(20)
        .exponential_backoff(Duration::from_millis(128), 2.0, Duration::from_secs(30))
        .full_jitter()
        .build()
        .expect("valid retry config");
    ResiliencePolicy::with_clock(retry, CircuitBreakerConfig::default(), clock)
        .expect("valid policy")
}

/// A dependency that is down for a while, then recovers.
///
/// The breaker opens after five attempts, rejects while cooling down, and
/// closes again on the first successful call.
#[tokio::test(start_paused = true)]
async fn test_outage_and_recovery_cycle() {
    init_tracing();
    let clock = MockClock::new();
    let policy = twenty_attempt_policy(clock.clone());
    let healthy = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let calls = Arc::new(AtomicU32::new(0));

    let op = {
        let healthy = Arc::clone(&healthy);
        let calls = Arc::clone(&calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let up = healthy.load(Ordering::SeqCst);
            async move {
                if up {
                    Ok("ack")
                } else {
                    Err(TestError { message: "connection refused".into() })
                }
            }
        }
    };

    let err = policy.execute(&op).await.unwrap_err();
    assert!(matches!(err, PolicyError::CircuitOpen { attempts: 5 }));
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    clock.advance(Duration::from_millis(500));
    let err = policy.execute(&op).await.unwrap_err();
    assert!(matches!(err, PolicyError::CircuitOpen { attempts: 0 }));
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    healthy.store(true, Ordering::SeqCst);
    clock.advance(Duration::from_millis(1500));
    assert_eq!(policy.execute(&op).await.unwrap(), "ack");
    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert_eq!(policy.circuit_state(), CircuitState::Closed);

    let metrics = policy.breaker_metrics();
    assert_eq!(metrics.times_opened, 1);
    assert_eq!(metrics.consecutive_failures, 0);
}

/// Transient failures below the breaker threshold are absorbed by retry.
#[tokio::test(start_paused = true)]
async fn test_transient_failures_absorbed() {
    let policy = twenty_attempt_policy(MockClock::new());
    let calls = Arc::new(AtomicU32::new(0));

    let counter = Arc::clone(&calls);
    let result = policy
        .execute(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 4 {
                    Err(TestError { message: format!("timeout #{n}") })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), 4);
    assert_eq!(policy.circuit_state(), CircuitState::Closed);
}

/// Concurrent callers share one breaker; a flood of failures opens it once.
#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_breaker() {
    let policy = twenty_attempt_policy(MockClock::new());
    let calls = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let policy = policy.clone();
        let calls = Arc::clone(&calls);
        handles.push(tokio::spawn(async move {
            policy
                .execute(move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(TestError { message: "down".into() }) }
                })
                .await
        }));
    }

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, PolicyError::CircuitOpen { .. }));
    }

    assert_eq!(policy.circuit_state(), CircuitState::Open);
    assert_eq!(policy.breaker_metrics().times_opened, 1);
    assert!(calls.load(Ordering::SeqCst) < 20);
}
