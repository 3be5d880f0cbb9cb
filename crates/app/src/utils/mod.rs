//! Helpers shared by the binary and the application context

pub mod logging;
pub mod signal;
