//! Database instance handler behavior against an in-memory provider.

mod common;

use common::FakeDatabase;
use lights_out::config::{LightsOutConfig, RdsDefaults};
use lights_out::error::ErrorKind;
use lights_out::handlers::{RdsInstanceHandler, ResourceHandler, SharedClients};
use lights_out::models::DiscoveredResource;
use lights_out::registry::HandlerFactory;
use std::sync::Arc;
use std::time::Duration;

fn db_resource() -> DiscoveredResource {
    DiscoveredResource::from_tagged_arn(
        "arn:aws:rds:eu-west-1:123456789012:db:orders-db",
        Default::default(),
    )
}

fn handler(fake: &FakeDatabase, settings: RdsDefaults) -> RdsInstanceHandler {
    RdsInstanceHandler::with_client(db_resource(), settings, Arc::new(fake.clone()))
}

#[tokio::test]
async fn test_start_from_stopped() {
    let fake = FakeDatabase::new().with_instance("orders-db", "stopped");

    let result = handler(&fake, RdsDefaults::default()).start().await.unwrap();

    assert!(result.success);
    assert_eq!(result.message, "Database start initiated (was stopped)");
    assert_eq!(fake.start_calls(), vec!["orders-db"]);
    assert!(result.previous_state.unwrap().is_stopped);
    assert_eq!(result.region.as_deref(), Some("eu-west-1"));
}

#[tokio::test]
async fn test_start_is_idempotent_when_available_or_starting() {
    for state in ["available", "starting"] {
        let fake = FakeDatabase::new().with_instance("orders-db", state);

        let result = handler(&fake, RdsDefaults::default()).start().await.unwrap();

        assert!(result.success);
        assert!(result.message.contains("already"), "{}", result.message);
        assert!(fake.start_calls().is_empty());
    }
}

#[tokio::test]
async fn test_stop_passes_snapshot_flag_through() {
    let fake = FakeDatabase::new().with_instance("orders-db", "available");
    let settings = RdsDefaults {
        skip_final_snapshot: true,
        ..Default::default()
    };

    let result = handler(&fake, settings).stop().await.unwrap();

    assert!(result.success);
    let calls = fake.stop_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].identifier, "orders-db");
    assert!(calls[0].skip_final_snapshot);
    assert_eq!(fake.status("orders-db").as_deref(), Some("stopping"));
}

#[tokio::test]
async fn test_second_stop_is_idempotent() {
    let fake = FakeDatabase::new().with_instance("orders-db", "available");
    let handler = handler(&fake, RdsDefaults::default());

    handler.stop().await.unwrap();
    let second = handler.stop().await.unwrap();

    assert!(second.success);
    assert_eq!(second.message, "Database already stopping");
    assert_eq!(fake.stop_calls().len(), 1);
}

#[tokio::test]
async fn test_transitional_state_is_rejected_without_calls() {
    let fake = FakeDatabase::new().with_instance("orders-db", "modifying");

    let result = handler(&fake, RdsDefaults::default()).stop().await.unwrap();

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::ValidationError));
    assert_eq!(
        result.error.as_deref(),
        Some("Cannot stop database in state 'modifying'")
    );
    assert!(fake.stop_calls().is_empty());
    assert!(fake.start_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fixed_wait_after_command() {
    let fake = FakeDatabase::new().with_instance("orders-db", "stopped");
    let settings = RdsDefaults {
        wait_after_command_seconds: 20,
        ..Default::default()
    };
    let started = tokio::time::Instant::now();

    let result = handler(&fake, settings).start().await.unwrap();

    assert!(result.success);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
    // Fire-and-forget: the instance is still transitioning
    assert_eq!(fake.status("orders-db").as_deref(), Some("starting"));
}

#[tokio::test]
async fn test_command_error_is_verbatim() {
    let fake = FakeDatabase::new()
        .with_instance("orders-db", "stopped")
        .with_command_error("InvalidDBInstanceState");

    let err = handler(&fake, RdsDefaults::default()).start().await.unwrap_err();

    assert_eq!(err.to_string(), "InvalidDBInstanceState");
}

#[tokio::test]
async fn test_status_and_readiness() {
    let fake = FakeDatabase::new().with_instance("orders-db", "available");
    let handler = handler(&fake, RdsDefaults::default());

    let status = handler.get_status().await.unwrap();
    assert_eq!(status.status, "available");
    assert!(!status.is_stopped);
    assert!(handler.is_ready().await);

    let missing = FakeDatabase::new();
    let handler = RdsInstanceHandler::with_client(db_resource(), RdsDefaults::default(), Arc::new(missing));
    assert!(!handler.is_ready().await);
    assert_eq!(
        handler.get_status().await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_factory_builds_database_handler() {
    let fake = FakeDatabase::new().with_instance("orders-db", "stopped");
    let clients: Arc<dyn lights_out::handlers::ClientProvider> = Arc::new(SharedClients::new(
        Arc::new(common::FakeContainerService::new()),
        Arc::new(fake.clone()),
    ));

    let handler = HandlerFactory::with_defaults()
        .get_handler(&db_resource(), &LightsOutConfig::default(), &clients)
        .unwrap();

    assert_eq!(handler.resource_type(), "rds-db");
    assert_eq!(handler.resource_id(), "orders-db");
    assert!(handler.start().await.unwrap().success);
    assert_eq!(fake.start_calls().len(), 1);
}
