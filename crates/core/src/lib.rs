//! # Dispatch Core
//!
//! Publish and connection logic with no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the broker client (traits)
//! - The connection manager owning the producer/consumer pair
//! - The resilient publisher and its dead-letter fallback
//!
//! ## Architecture Principles
//! - Only depends on `dispatch-common` and `dispatch-domain`
//! - No broker client code; adapters live in `dispatch-infra`
//! - All external dependencies via traits

pub mod broker;
pub mod connection;
pub mod publish;

pub use broker::ports::{BrokerClient, BrokerSession, MessageConsumer, MessageProducer};
pub use connection::ConnectionManager;
pub use publish::{DeadLetterForwarder, Publisher};
