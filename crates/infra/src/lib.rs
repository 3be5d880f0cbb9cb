//! # Dispatch Infrastructure
//!
//! Infrastructure implementations of the core broker ports.
//!
//! This crate contains:
//! - Configuration loading from the environment and JSON/TOML files
//! - The in-memory broker used by tests and local runs
//! - The Kafka adapter (`kafka` feature)
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `dispatch-core`
//! - Contains all "impure" code (I/O, network, global subscriber)

pub mod broker;
pub mod config;
pub mod observability;

// Re-export commonly used items
#[cfg(feature = "kafka")]
pub use broker::KafkaBroker;
pub use broker::InMemoryBroker;
pub use observability::init_logging;
