//! Integration tests for the in-memory broker
//!
//! Drives the core connection manager and publisher against
//! [`InMemoryBroker`] to check the adapter honours the port contract.

use std::sync::Arc;

use dispatch_common::resilience::{CircuitState, MockClock};
use dispatch_core::publish::policy::publish_policy_with_clock;
use dispatch_core::{ConnectionManager, Publisher};
use dispatch_domain::{BrokerConfig, DeadLetterOutcome, DeadLetterRecord, DispatchError};
use dispatch_infra::InMemoryBroker;
use serde_json::{json, Value};

fn connection(broker: &InMemoryBroker) -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::new(Arc::new(broker.clone()), BrokerConfig::default()).unwrap())
}

fn publisher(connection: &Arc<ConnectionManager>) -> Publisher<MockClock> {
    let policy = publish_policy_with_clock(MockClock::new()).unwrap();
    Publisher::with_policy(Arc::clone(connection), policy)
}

#[tokio::test]
async fn test_connect_joins_reporting_group() {
    let broker = InMemoryBroker::new();
    let connection = connection(&broker);

    connection.connect().await.unwrap();
    assert_eq!(broker.active_groups(), vec!["reporting-consumer-v1".to_string()]);

    connection.disconnect().await.unwrap();
    assert!(broker.active_groups().is_empty());
}

#[tokio::test]
async fn test_unreachable_broker_fails_connect() {
    let broker = InMemoryBroker::new();
    broker.set_unreachable(true);
    let connection = connection(&broker);

    let err = connection.connect().await.unwrap_err();

    assert!(matches!(err, DispatchError::Connection(_)));
    assert!(!connection.is_connected().await);
}

#[tokio::test(start_paused = true)]
async fn test_publish_records_messages() {
    let broker = InMemoryBroker::new();
    let connection = connection(&broker);
    connection.connect().await.unwrap();
    let publisher = publisher(&connection);

    let receipt = publisher
        .send(&[json!({ "id": 1 }), json!({ "id": 2 })], "reports")
        .await
        .unwrap();

    assert_eq!(receipt.message_count, 2);
    let ids: Vec<Value> = broker
        .published("reports")
        .iter()
        .map(|m| serde_json::from_str::<Value>(&m.value).unwrap()["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
}

#[tokio::test(start_paused = true)]
async fn test_failing_topic_is_dead_lettered() {
    let broker = InMemoryBroker::new();
    let connection = connection(&broker);
    connection.connect().await.unwrap();
    let publisher = publisher(&connection);
    broker.fail_topic("reports");

    let err = publisher.send(&[json!({ "id": 1 })], "reports").await.unwrap_err();

    match err {
        DispatchError::PublishFailed { topic, attempts, dead_letter, .. } => {
            assert_eq!(topic, "reports");
            assert_eq!(attempts, 5);
            assert_eq!(dead_letter, DeadLetterOutcome::Forwarded);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(broker.published_count("reports"), 0);
    let dead_letters = broker.dead_letters();
    assert_eq!(dead_letters.len(), 1);
    assert_eq!(dead_letters[0].topic, "reports");
    assert!(!dead_letters[0].error.is_empty());
    assert_eq!(publisher.circuit_state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_total_outage_drops_dead_letter() {
    let broker = InMemoryBroker::new();
    let connection = connection(&broker);
    connection.connect().await.unwrap();
    let publisher = publisher(&connection);
    broker.set_fail_sends(true);

    let err = publisher.send(&[json!({ "id": 1 })], "reports").await.unwrap_err();

    assert!(matches!(
        err,
        DispatchError::PublishFailed { dead_letter: DeadLetterOutcome::Dropped(_), .. }
    ));
    assert_eq!(broker.dead_letters(), Vec::<DeadLetterRecord>::new());
    assert_eq!(broker.send_attempts(), 6);
}
