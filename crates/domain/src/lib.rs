//! # Dispatch Domain
//!
//! Domain types for the dispatch service.
//!
//! This crate contains:
//! - Broker and logging configuration structures
//! - Domain error types and Result definitions
//! - Outbound batch, dead-letter and receipt types
//! - Domain constants (dead-letter topic, consumer group)
//!
//! ## Architecture
//! - Only depends on the foundation tier of `dispatch-common`
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
