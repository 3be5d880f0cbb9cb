//! Broker client boundary

pub mod ports;

pub use ports::{BrokerClient, BrokerSession, MessageConsumer, MessageProducer};
