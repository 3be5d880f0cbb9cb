//! Shared building blocks for the dispatch crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error types and classification
//! - `runtime`: async infrastructure (resilience, lifecycle)
//! - `observability`: tracing support, pulled in by `runtime`

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod lifecycle;
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{
    BoxError, CommonError, CommonResult, ErrorClassification, ErrorSeverity, LifecyclePhase,
};
#[cfg(feature = "runtime")]
pub use lifecycle::manager::{
    LifecycleError, ManagerController, ManagerLifecycle, ManagerStatus, SharedState,
};
#[cfg(feature = "runtime")]
pub use resilience::{
    BackoffStrategy, CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder,
    CircuitBreakerMetrics, CircuitState, Clock, Jitter, MockClock, PolicyError, PolicyResult,
    ResilienceError, ResiliencePolicy, ResilienceResult, RetryConfig, RetryConfigBuilder,
    RetryDecision, RetryError, RetryExecutor, RetryPolicy, RetryResult, SystemClock,
};
