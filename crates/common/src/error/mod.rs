//! Error types shared by the dispatch crates
//!
//! - **`CommonError`**: failures raised by the shared runtime pieces, such as
//!   a managed service that failed to start or stop. The underlying error is
//!   kept as the `source` so callers can recover their own error type.
//! - **`ErrorClassification`**: a standard interface for classifying errors
//!   by retryability and severity, implemented by module-specific errors.
//! - **`ErrorSeverity`**: a single severity scale used for logging.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Type-erased error carried as a source
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Step of a managed service's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Initialize,
    Shutdown,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialize => write!(f, "initialize"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Errors raised by the shared runtime
#[derive(Debug, Error)]
pub enum CommonError {
    /// A managed service failed a lifecycle step
    #[error("manager '{manager}' failed to {phase}: {source}")]
    Lifecycle {
        manager: String,
        phase: LifecyclePhase,
        #[source]
        source: BoxError,
    },
}

impl CommonError {
    pub fn lifecycle<S: Into<String>>(manager: S, phase: LifecyclePhase, source: BoxError) -> Self {
        Self::Lifecycle { manager: manager.into(), phase, source }
    }

    /// Name of the manager that failed
    pub fn manager(&self) -> &str {
        match self {
            Self::Lifecycle { manager, .. } => manager,
        }
    }

    /// Recover the error the manager returned
    ///
    /// Returns the error itself when the source is not an `E`.
    pub fn downcast_source<E>(self) -> Result<E, Self>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            Self::Lifecycle { manager, phase, source } => match source.downcast::<E>() {
                Ok(original) => Ok(*original),
                Err(source) => Err(Self::Lifecycle { manager, phase, source }),
            },
        }
    }
}

/// Error classification trait for consistent error handling across modules
///
/// Lets callers decide whether to re-queue a failed operation and how loudly
/// to log it without matching on every concrete error type.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as timeouts, an open circuit, or a temporarily unreachable
    /// broker.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("broker refused: {0}")]
    struct Refused(String);

    #[test]
    fn test_lifecycle_display_includes_source() {
        let err = CommonError::lifecycle(
            "broker_connection",
            LifecyclePhase::Initialize,
            Box::new(Refused("ECONNREFUSED".into())),
        );

        assert_eq!(
            err.to_string(),
            "manager 'broker_connection' failed to initialize: broker refused: ECONNREFUSED"
        );
        assert_eq!(err.manager(), "broker_connection");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_downcast_source_recovers_original() {
        let err = CommonError::lifecycle(
            "broker_connection",
            LifecyclePhase::Shutdown,
            Box::new(Refused("closed".into())),
        );

        assert_eq!(err.downcast_source::<Refused>().unwrap(), Refused("closed".into()));
    }

    #[test]
    fn test_downcast_source_keeps_error_on_mismatch() {
        let err = CommonError::lifecycle("a", LifecyclePhase::Shutdown, "stuck".into());

        let err = err.downcast_source::<Refused>().unwrap_err();

        assert!(matches!(err, CommonError::Lifecycle { phase: LifecyclePhase::Shutdown, .. }));
        assert!(err.to_string().contains("stuck"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }
}
