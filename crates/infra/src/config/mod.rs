//! Configuration loading
//!
//! Reads [`dispatch_domain::Config`] from `DISPATCH_*` environment variables
//! or a JSON/TOML file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, load_or_default, discover_config_path};
