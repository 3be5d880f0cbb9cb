//! Resilient publishing
//!
//! - [`codec`]: JSON encoding of outbound batches and dead-letter records
//! - [`policy`]: the retry-around-breaker policy used for broker sends
//! - [`dead_letter`]: best-effort forwarding of failures to `dlx-logs`
//! - [`service`]: the [`Publisher`] tying them together

pub mod codec;
pub mod dead_letter;
pub mod policy;
pub mod service;

pub use dead_letter::DeadLetterForwarder;
pub use policy::{publish_policy, publish_policy_with_clock};
pub use service::Publisher;
