//! Shared test helpers for `dispatch-core` integration tests.

#![allow(dead_code)]

pub mod broker;
pub mod logs;

pub use broker::{StubBroker, StubState};
pub use logs::LogCapture;
