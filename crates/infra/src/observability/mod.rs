//! Logging setup for the service binary

pub mod logging;

pub use logging::init_logging;
