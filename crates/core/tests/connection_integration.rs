//! Integration tests for the connection manager

mod support;

use std::sync::Arc;

use dispatch_common::lifecycle::{ManagerController, ManagerLifecycle, ManagerStatus};
use dispatch_core::ConnectionManager;
use dispatch_domain::{BrokerConfig, ConnectionStatus, DispatchError};
use support::{StubBroker, StubState};

fn manager(broker: &StubBroker) -> ConnectionManager {
    ConnectionManager::new(Arc::new(broker.clone()), BrokerConfig::default()).unwrap()
}

#[tokio::test]
async fn test_connect_opens_producer_then_consumer() {
    let broker = StubBroker::new();
    let manager = manager(&broker);
    assert!(!manager.is_connected().await);

    manager.connect().await.unwrap();

    assert!(manager.is_connected().await);
    assert_eq!(manager.status().await, ConnectionStatus::Connected);
    assert_eq!(
        broker.state.calls(),
        vec!["producer.connect", "consumer.connect:reporting-consumer-v1"]
    );
    assert!(manager.producer().await.is_ok());
}

#[tokio::test]
async fn test_disconnect_closes_consumer_then_producer() {
    let broker = StubBroker::new();
    let manager = manager(&broker);
    manager.connect().await.unwrap();
    broker.state.calls.lock().clear();

    manager.disconnect().await.unwrap();

    assert!(!manager.is_connected().await);
    assert_eq!(broker.state.calls(), vec!["consumer.disconnect", "producer.disconnect"]);
    assert!(matches!(manager.producer().await, Err(DispatchError::NotConnected(_))));
}

#[tokio::test]
async fn test_disconnect_without_connect_is_a_no_op() {
    let broker = StubBroker::new();
    let manager = manager(&broker);

    manager.disconnect().await.unwrap();
    manager.disconnect().await.unwrap();

    assert!(broker.state.calls().is_empty());
    assert_eq!(manager.status().await, ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_second_connect_keeps_existing_session() {
    let broker = StubBroker::new();
    let manager = manager(&broker);

    manager.connect().await.unwrap();
    manager.connect().await.unwrap();

    assert_eq!(broker.state.sessions_created.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(broker.state.calls().len(), 2);
}

#[tokio::test]
async fn test_reconnect_after_disconnect_creates_new_session() {
    let broker = StubBroker::new();
    let manager = manager(&broker);

    manager.connect().await.unwrap();
    manager.disconnect().await.unwrap();
    manager.connect().await.unwrap();

    assert!(manager.is_connected().await);
    assert_eq!(broker.state.sessions_created.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_producer_connect_failure_leaves_disconnected() {
    let broker = StubBroker::new();
    StubState::set(&broker.state.fail_producer_connect, true);
    let manager = manager(&broker);

    let err = manager.connect().await.unwrap_err();

    assert!(matches!(err, DispatchError::Connection(_)));
    assert!(!manager.is_connected().await);
}

#[tokio::test]
async fn test_consumer_connect_failure_tears_down_producer() {
    let broker = StubBroker::new();
    StubState::set(&broker.state.fail_consumer_connect, true);
    let manager = manager(&broker);

    let err = manager.connect().await.unwrap_err();

    assert!(matches!(err, DispatchError::Connection(_)));
    assert!(!manager.is_connected().await);
    assert!(broker.state.calls().contains(&"producer.disconnect".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_connect_times_out_on_unreachable_broker() {
    let broker = StubBroker::new();
    StubState::set(&broker.state.hang_connect, true);
    let manager = manager(&broker);

    let started = tokio::time::Instant::now();
    let err = manager.connect().await.unwrap_err();

    assert!(matches!(err, DispatchError::Timeout(ref msg) if msg.contains("3000 ms")));
    assert!(started.elapsed() >= std::time::Duration::from_millis(3000));
    assert!(!manager.is_connected().await);
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_bounds_hung_teardown() {
    let broker = StubBroker::new();
    StubState::set(&broker.state.hang_connect, true);
    StubState::set(&broker.state.hang_disconnect, true);
    let manager = manager(&broker);

    let started = tokio::time::Instant::now();
    let err = manager.connect().await.unwrap_err();

    assert!(matches!(err, DispatchError::Timeout(_)));
    assert!(started.elapsed() < std::time::Duration::from_millis(7000));
    assert!(broker.state.calls().contains(&"consumer.disconnect".to_string()));
    assert!(!manager.is_connected().await);
}

#[tokio::test(start_paused = true)]
async fn test_failed_connect_with_hung_teardown_still_returns_error() {
    let broker = StubBroker::new();
    StubState::set(&broker.state.fail_consumer_connect, true);
    StubState::set(&broker.state.hang_disconnect, true);
    let manager = manager(&broker);

    let err = manager.connect().await.unwrap_err();

    assert!(matches!(err, DispatchError::Connection(ref msg) if msg.contains("coordinator")));
    assert!(!manager.is_connected().await);

    StubState::set(&broker.state.fail_consumer_connect, false);
    StubState::set(&broker.state.hang_disconnect, false);
    manager.connect().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_error_still_releases_handles() {
    let broker = StubBroker::new();
    let manager = manager(&broker);
    manager.connect().await.unwrap();
    StubState::set(&broker.state.fail_consumer_disconnect, true);

    let err = manager.disconnect().await.unwrap_err();

    assert!(matches!(err, DispatchError::Broker(_)));
    assert!(!manager.is_connected().await);
    assert!(broker.state.calls().contains(&"producer.disconnect".to_string()));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = BrokerConfig { brokers: Vec::new(), ..BrokerConfig::default() };

    let result = ConnectionManager::new(Arc::new(StubBroker::new()), config);

    assert!(matches!(result, Err(DispatchError::Config(_))));
}

#[tokio::test]
async fn test_lifecycle_hooks_drive_connection() {
    let broker = StubBroker::new();
    let manager = Arc::new(manager(&broker));
    assert_eq!(ManagerLifecycle::status(manager.as_ref()).await, ManagerStatus::Created);

    let mut controller = ManagerController::new();
    controller.add_manager(Arc::clone(&manager) as Arc<dyn ManagerLifecycle>);

    controller.initialize_all().await.unwrap();
    assert!(manager.is_connected().await);
    assert_eq!(ManagerLifecycle::status(manager.as_ref()).await, ManagerStatus::Running);

    controller.shutdown_all().await.unwrap();
    assert!(!manager.is_connected().await);
    assert_eq!(ManagerLifecycle::status(manager.as_ref()).await, ManagerStatus::Shutdown);
}

#[tokio::test]
async fn test_lifecycle_initialize_surfaces_connect_failure() {
    let broker = StubBroker::new();
    StubState::set(&broker.state.fail_producer_connect, true);
    let mut controller = ManagerController::new();
    controller.add_manager(Arc::new(manager(&broker)));

    let err = controller.initialize_all().await.unwrap_err();

    assert!(err.to_string().contains("ECONNREFUSED"));
    assert_eq!(err.manager(), "connection_manager");
    assert_eq!(controller.status().await, ManagerStatus::Error);
    assert_eq!(
        err.downcast_source::<DispatchError>().unwrap(),
        DispatchError::Connection("ECONNREFUSED".into())
    );
}
