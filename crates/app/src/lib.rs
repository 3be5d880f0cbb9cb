//! # Dispatch App
//!
//! Service entry point and wiring.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Shutdown signal handling
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod utils;

pub use context::AppContext;
