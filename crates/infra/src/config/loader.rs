//! Configuration loader
//!
//! Loads service configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when `DISPATCH_BROKERS` is set
//! 2. Otherwise the first config file found by [`discover_config_path`]
//! 3. [`load_or_default`] falls back to built-in defaults when neither exists
//!
//! ## Environment Variables
//! - `DISPATCH_BROKERS`: Comma separated broker list (required)
//! - `DISPATCH_CLIENT_ID`: Client id reported to the broker
//! - `DISPATCH_CONNECTION_TIMEOUT_MS`: Connect timeout in milliseconds
//! - `DISPATCH_AUTHENTICATION_TIMEOUT_MS`: Authentication timeout in milliseconds
//! - `DISPATCH_REQUEST_TIMEOUT_MS`: Per-request timeout in milliseconds
//! - `DISPATCH_BROKER_LOG_LEVEL`: Broker client log level
//! - `DISPATCH_LOG_LEVEL`: Service log level
//! - `DISPATCH_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader checks the following paths (in order):
//! 1. `./dispatch.json` or `./dispatch.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use dispatch_domain::{BrokerConfig, Config, DispatchError, LogLevel, LoggingConfig, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["dispatch.json", "dispatch.toml", "config.json", "config.toml"];

/// Load configuration from the environment, falling back to a config file
///
/// The environment is used whenever `DISPATCH_BROKERS` is set, and an invalid
/// `DISPATCH_*` value is then reported rather than skipped. The result is
/// validated before it is returned.
///
/// # Errors
/// Returns `DispatchError::Config` if the selected source is missing or
/// does not yield a valid configuration.
pub fn load() -> Result<Config> {
    let config = if std::env::var_os("DISPATCH_BROKERS").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else {
        tracing::debug!("DISPATCH_BROKERS not set, trying config file");
        load_from_file(None)?
    };

    config.validate()?;
    Ok(config)
}

/// Like [`load`], but uses the defaults when no source is present
///
/// A source that exists but is malformed is still an error.
pub fn load_or_default() -> Result<Config> {
    if std::env::var_os("DISPATCH_BROKERS").is_some() || discover_config_path().is_some() {
        return load();
    }

    tracing::info!("No configuration source found, using defaults");
    Ok(Config::default())
}

/// Load configuration from `DISPATCH_*` environment variables
///
/// Only `DISPATCH_BROKERS` is required; every other setting keeps its
/// default when unset.
///
/// # Errors
/// Returns `DispatchError::Config` if `DISPATCH_BROKERS` is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let brokers = parse_broker_list(&env_var("DISPATCH_BROKERS")?);
    let defaults = BrokerConfig::default();

    let broker = BrokerConfig {
        client_id: std::env::var("DISPATCH_CLIENT_ID").unwrap_or(defaults.client_id),
        brokers,
        connection_timeout_ms: env_parse(
            "DISPATCH_CONNECTION_TIMEOUT_MS",
            defaults.connection_timeout_ms,
        )?,
        authentication_timeout_ms: env_parse(
            "DISPATCH_AUTHENTICATION_TIMEOUT_MS",
            defaults.authentication_timeout_ms,
        )?,
        request_timeout_ms: env_parse("DISPATCH_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?,
        log_level: env_parse::<LogLevel>("DISPATCH_BROKER_LOG_LEVEL", defaults.log_level)?,
    };

    let logging_defaults = LoggingConfig::default();
    let logging = LoggingConfig {
        level: env_parse::<LogLevel>("DISPATCH_LOG_LEVEL", logging_defaults.level)?,
        json: env_bool("DISPATCH_LOG_JSON", logging_defaults.json),
    };

    Ok(Config { broker, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DispatchError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DispatchError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => discover_config_path().ok_or_else(|| {
            DispatchError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DispatchError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DispatchError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DispatchError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DispatchError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the working or executable directory
pub fn discover_config_path() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    find_config_in(&dirs)
}

fn find_config_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn parse_broker_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        DispatchError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional variable, keeping `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| DispatchError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
