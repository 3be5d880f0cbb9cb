//! Broker connection lifecycle

pub mod manager;

pub use manager::ConnectionManager;
