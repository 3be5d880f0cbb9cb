//! In-process broker
//!
//! Implements the broker port without a network. Every accepted batch is
//! recorded per topic, and failure switches let callers simulate an
//! unreachable cluster or failing topics.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dispatch_core::broker::ports::{BrokerClient, BrokerSession, MessageConsumer, MessageProducer};
use dispatch_domain::constants::DEAD_LETTER_TOPIC;
use dispatch_domain::{
    BrokerConfig, DeadLetterRecord, DispatchError, OutboundBatch, Result, SerializedMessage,
};
use parking_lot::Mutex;
use tracing::{debug, trace};

type TopicLog = Mutex<HashMap<String, Vec<SerializedMessage>>>;

#[derive(Default)]
struct MemoryState {
    topics: TopicLog,
    groups: Mutex<Vec<String>>,
    sessions: AtomicU64,
    send_attempts: AtomicU64,

    unreachable: AtomicBool,
    fail_all_sends: AtomicBool,
    failing_topics: Mutex<HashSet<String>>,
    send_delay: Mutex<Option<Duration>>,
    connect_delay: Mutex<Option<Duration>>,
}

impl MemoryState {
    async fn wait_for_connect(&self) {
        let delay = *self.connect_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_reachable(&self, servers: &str) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(DispatchError::Connection(format!("connect ECONNREFUSED {servers}")));
        }
        Ok(())
    }

    fn send_error(&self, topic: &str) -> Option<DispatchError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Some(DispatchError::Broker("broker transport failure".to_string()));
        }
        if self.fail_all_sends.load(Ordering::SeqCst) || self.failing_topics.lock().contains(topic)
        {
            return Some(DispatchError::Broker(format!(
                "leader not available for topic '{topic}'"
            )));
        }
        None
    }
}

/// Broker that keeps published messages in memory
///
/// Clones share state, so a test can keep a handle while the connection
/// manager owns another.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<MemoryState>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse connections and fail every send while `true`
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Fail every send, on every topic, while `true`
    pub fn set_fail_sends(&self, fail: bool) {
        self.state.fail_all_sends.store(fail, Ordering::SeqCst);
    }

    /// Fail sends to `topic` until [`restore_topic`](Self::restore_topic)
    pub fn fail_topic(&self, topic: impl Into<String>) {
        self.state.failing_topics.lock().insert(topic.into());
    }

    pub fn restore_topic(&self, topic: &str) {
        self.state.failing_topics.lock().remove(topic);
    }

    /// Delay applied before every producer or consumer connect completes
    pub fn set_connect_delay(&self, delay: Option<Duration>) {
        *self.state.connect_delay.lock() = delay;
    }

    /// Delay applied before every send is accepted or rejected
    pub fn set_send_delay(&self, delay: Option<Duration>) {
        *self.state.send_delay.lock() = delay;
    }

    /// Messages accepted on `topic`, in publish order
    pub fn published(&self, topic: &str) -> Vec<SerializedMessage> {
        self.state.topics.lock().get(topic).cloned().unwrap_or_default()
    }

    pub fn published_count(&self, topic: &str) -> usize {
        self.state.topics.lock().get(topic).map_or(0, Vec::len)
    }

    /// Records accepted on the dead-letter topic
    ///
    /// Entries that do not decode as a [`DeadLetterRecord`] are skipped.
    pub fn dead_letters(&self) -> Vec<DeadLetterRecord> {
        self.published(DEAD_LETTER_TOPIC)
            .iter()
            .filter_map(|message| serde_json::from_str(&message.value).ok())
            .collect()
    }

    /// Sends attempted on any topic, accepted or not
    pub fn send_attempts(&self) -> u64 {
        self.state.send_attempts.load(Ordering::SeqCst)
    }

    pub fn sessions_created(&self) -> u64 {
        self.state.sessions.load(Ordering::SeqCst)
    }

    /// Consumer groups that currently have a connected member
    pub fn active_groups(&self) -> Vec<String> {
        self.state.groups.lock().clone()
    }
}

impl BrokerClient for InMemoryBroker {
    fn create_session(&self, config: &BrokerConfig, group_id: &str) -> Result<BrokerSession> {
        self.state.sessions.fetch_add(1, Ordering::SeqCst);
        let servers = config.bootstrap_servers();
        debug!(client_id = %config.client_id, brokers = %servers, "creating in-memory session");

        Ok(BrokerSession {
            producer: Arc::new(MemoryProducer {
                state: Arc::clone(&self.state),
                servers: servers.clone(),
                connected: AtomicBool::new(false),
            }),
            consumer: Arc::new(MemoryConsumer {
                state: Arc::clone(&self.state),
                servers,
                group_id: group_id.to_string(),
                connected: AtomicBool::new(false),
            }),
        })
    }
}

struct MemoryProducer {
    state: Arc<MemoryState>,
    servers: String,
    connected: AtomicBool,
}

#[async_trait]
impl MessageProducer for MemoryProducer {
    async fn connect(&self) -> Result<()> {
        self.state.wait_for_connect().await;
        self.state.check_reachable(&self.servers)?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, batch: &OutboundBatch) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DispatchError::NotConnected("producer is not connected".to_string()));
        }

        self.state.send_attempts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.state.send_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.state.send_error(&batch.topic) {
            return Err(err);
        }

        trace!(topic = %batch.topic, count = batch.len(), "batch accepted");
        self.state
            .topics
            .lock()
            .entry(batch.topic.clone())
            .or_default()
            .extend(batch.messages.iter().cloned());
        Ok(())
    }
}

struct MemoryConsumer {
    state: Arc<MemoryState>,
    servers: String,
    group_id: String,
    connected: AtomicBool,
}

#[async_trait]
impl MessageConsumer for MemoryConsumer {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    async fn connect(&self) -> Result<()> {
        self.state.wait_for_connect().await;
        self.state.check_reachable(&self.servers)?;
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.state.groups.lock().push(self.group_id.clone());
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.connected.swap(false, Ordering::SeqCst) {
            let mut groups = self.state.groups.lock();
            if let Some(pos) = groups.iter().position(|g| g == &self.group_id) {
                groups.remove(pos);
            }
        }
        Ok(())
    }
}
