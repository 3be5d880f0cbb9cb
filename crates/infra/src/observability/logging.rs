//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set. Otherwise the service level comes from
//! [`LoggingConfig`] and the broker client's own targets use the broker log
//! level.

use dispatch_domain::{DispatchError, LogLevel, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Targets emitted by the broker client library
const BROKER_TARGETS: [&str; 2] = ["rdkafka", "librdkafka"];

/// Install the global subscriber
///
/// # Errors
/// Returns `DispatchError::Config` for an unparsable filter and
/// `DispatchError::Internal` if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig, broker_level: LogLevel) -> Result<()> {
    let directives = filter_directives(config, broker_level, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| DispatchError::Config(format!("Invalid log filter '{directives}': {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| DispatchError::Internal(format!("logging already initialized: {e}")))
}

fn filter_directives(
    config: &LoggingConfig,
    broker_level: LogLevel,
    rust_log: Option<String>,
) -> String {
    if let Some(directives) = rust_log.filter(|s| !s.trim().is_empty()) {
        return directives;
    }

    let mut directives = vec![config.level.to_string()];
    directives.extend(BROKER_TARGETS.iter().map(|target| format!("{target}={broker_level}")));
    directives.join(",")
}
