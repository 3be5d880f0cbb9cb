//! Recording broker stub
//!
//! Every port call is appended to a shared log, and switches on
//! [`StubState`] make individual operations fail or hang.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dispatch_core::broker::ports::{BrokerClient, BrokerSession, MessageConsumer, MessageProducer};
use dispatch_domain::constants::DEAD_LETTER_TOPIC;
use dispatch_domain::{BrokerConfig, DispatchError, OutboundBatch, Result};
use parking_lot::Mutex;

#[derive(Default)]
pub struct StubState {
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<OutboundBatch>>,
    pub dead_letters: Mutex<Vec<OutboundBatch>>,
    pub sessions_created: AtomicU32,
    pub send_attempts: AtomicU32,

    pub fail_producer_connect: AtomicBool,
    pub fail_consumer_connect: AtomicBool,
    pub hang_connect: AtomicBool,
    pub fail_consumer_disconnect: AtomicBool,
    pub hang_disconnect: AtomicBool,
    pub fail_sends: AtomicBool,
    pub hang_sends: AtomicBool,
    pub fail_dead_letter: AtomicBool,
}

impl StubState {
    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn send_attempts(&self) -> u32 {
        self.send_attempts.load(Ordering::SeqCst)
    }

    pub fn dead_letter_attempts(&self) -> usize {
        self.dead_letters.lock().len()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

#[derive(Clone, Default)]
pub struct StubBroker {
    pub state: Arc<StubState>,
}

impl StubBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BrokerClient for StubBroker {
    fn create_session(&self, _config: &BrokerConfig, group_id: &str) -> Result<BrokerSession> {
        self.state.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(BrokerSession {
            producer: Arc::new(StubProducer { state: Arc::clone(&self.state) }),
            consumer: Arc::new(StubConsumer {
                state: Arc::clone(&self.state),
                group_id: group_id.to_string(),
            }),
        })
    }
}

struct StubProducer {
    state: Arc<StubState>,
}

#[async_trait]
impl MessageProducer for StubProducer {
    async fn connect(&self) -> Result<()> {
        self.state.record("producer.connect");
        if self.state.hang_connect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.fail_producer_connect.load(Ordering::SeqCst) {
            return Err(DispatchError::Connection("ECONNREFUSED".into()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.record("producer.disconnect");
        if self.state.hang_disconnect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn send(&self, batch: &OutboundBatch) -> Result<()> {
        if batch.topic == DEAD_LETTER_TOPIC {
            self.state.dead_letters.lock().push(batch.clone());
            if self.state.fail_dead_letter.load(Ordering::SeqCst) {
                return Err(DispatchError::Broker("dead-letter topic unavailable".into()));
            }
            return Ok(());
        }

        self.state.send_attempts.fetch_add(1, Ordering::SeqCst);
        self.state.sent.lock().push(batch.clone());
        if self.state.hang_sends.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.fail_sends.load(Ordering::SeqCst) {
            return Err(DispatchError::Broker("leader not available".into()));
        }
        Ok(())
    }
}

struct StubConsumer {
    state: Arc<StubState>,
    group_id: String,
}

#[async_trait]
impl MessageConsumer for StubConsumer {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    async fn connect(&self) -> Result<()> {
        self.state.record(&format!("consumer.connect:{}", self.group_id));
        if self.state.fail_consumer_connect.load(Ordering::SeqCst) {
            return Err(DispatchError::Connection("group coordinator unavailable".into()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.record("consumer.disconnect");
        if self.state.hang_disconnect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.fail_consumer_disconnect.load(Ordering::SeqCst) {
            return Err(DispatchError::Broker("leave group failed".into()));
        }
        Ok(())
    }
}
