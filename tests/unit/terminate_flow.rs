//! Termination flows against stubbed ports.

#![allow(clippy::expect_used)]

use dockhost::application::services::terminate::{terminate_current, terminate_host};
use dockhost::domain::host::HostRecord;

use crate::mocks::{CloudFake, ContextFake, MemoryStore};

fn record() -> HostRecord {
    HostRecord {
        instance_id: "i-live".to_string(),
        instance_dns: "ip-10-0-0-3.ec2.internal".to_string(),
        port: 1111,
        instance_type: "m5.large".to_string(),
    }
}

#[tokio::test]
async fn terminate_current_uses_the_persisted_record() {
    let cloud = CloudFake::default();
    let contexts = ContextFake::default();
    let store = MemoryStore::with_record(record());

    let reported = terminate_current(&cloud, &contexts, &store)
        .await
        .expect("terminate");

    assert_eq!(reported, record());
    assert_eq!(cloud.calls(), ["terminate:i-live"]);
    assert_eq!(contexts.calls(), ["switch_default", "remove:i-live"]);
}

#[tokio::test]
async fn terminate_current_without_a_record_is_a_friendly_error() {
    let cloud = CloudFake::default();
    let contexts = ContextFake::default();
    let store = MemoryStore::default();

    let err = terminate_current(&cloud, &contexts, &store)
        .await
        .expect_err("expected Err");
    assert!(format!("{err:#}").contains("No active host recorded"));
    assert!(cloud.calls().is_empty());
    assert!(contexts.calls().is_empty());
}

/// The record is deliberately left in place after termination; the terminate
/// API is idempotent for already-gone ids.
#[tokio::test]
async fn terminate_current_keeps_the_stale_record() {
    let cloud = CloudFake::default();
    let contexts = ContextFake::default();
    let store = MemoryStore::with_record(record());

    terminate_current(&cloud, &contexts, &store)
        .await
        .expect("terminate");
    assert!(store.current().is_some());
}

#[tokio::test]
async fn terminate_by_id_cleans_up_even_when_the_call_fails() {
    let cloud = CloudFake {
        terminate_fails: true,
        ..CloudFake::default()
    };
    let contexts = ContextFake::default();

    let err = terminate_host(&cloud, &contexts, "i-gone")
        .await
        .expect_err("expected Err");
    assert!(format!("{err:#}").contains("terminating instance i-gone"));
    // cleanup ordering holds even on the failure path
    assert_eq!(contexts.calls(), ["switch_default", "remove:i-gone"]);
}
