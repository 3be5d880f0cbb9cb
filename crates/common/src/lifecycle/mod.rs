//! Lifecycle management utilities for async components
//!
//! - **[`manager`]**: ordered startup and shutdown of long-lived components

pub mod manager;

pub use manager::{LifecycleError, ManagerController, ManagerLifecycle, ManagerStatus, SharedState};
