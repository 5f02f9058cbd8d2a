//! Integration tests for the assembled service state

use bytes::Bytes;
use tempfile::TempDir;

use common::prelude::*;
use service::{Database, ServiceConfig, ServiceState};

const PASSWORD: &str = "service password";

async fn setup_test_state() -> (ServiceState, ServiceConfig, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = ServiceConfig {
        sqlite_path: Some(temp_dir.path().join("db.sqlite")),
        blobs_path: Some(temp_dir.path().join("blobs")),
        ..ServiceConfig::default()
    };
    let state = ServiceState::from_config(&config).await.unwrap();
    (state, config, temp_dir)
}

#[tokio::test]
async fn test_in_memory_state() {
    let state = ServiceState::from_config(&ServiceConfig::default())
        .await
        .unwrap();
    let fdp = state.fdp();

    let account = fdp.account().register("memory", PASSWORD).await.unwrap();
    let pod = fdp
        .personal_storage()
        .create(&account, "pod")
        .await
        .unwrap();
    assert_eq!(pod.index, 1);
}

#[tokio::test]
async fn test_full_flow() {
    let (state, _, _temp) = setup_test_state().await;
    let fdp = state.fdp();

    let account = fdp.account().register("alice", PASSWORD).await.unwrap();
    fdp.personal_storage()
        .create(&account, "docs")
        .await
        .unwrap();
    let tree = fdp.directory(&account, "docs", PASSWORD).await.unwrap();
    tree.create("/reports").await.unwrap();
    tree.upload("/reports/q1.txt", Bytes::from_static(b"numbers"))
        .await
        .unwrap();

    let listing = tree.list("/reports").await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "q1.txt");
    assert_eq!(
        tree.download("/reports/q1.txt").await.unwrap(),
        Bytes::from_static(b"numbers")
    );
}

#[tokio::test]
async fn test_records_persist_in_sqlite() {
    let (state, config, _temp) = setup_test_state().await;
    let fdp = state.fdp();

    let account = fdp.account().register("bob", PASSWORD).await.unwrap();
    fdp.personal_storage()
        .create(&account, "photos")
        .await
        .unwrap();

    // a second client with its own connection to the same database file
    let url = url::Url::parse(&format!(
        "sqlite://{}",
        config.sqlite_path.as_ref().unwrap().display()
    ))
    .unwrap();
    let database = Database::connect(&url).await.unwrap();
    let other = Fdp::new(
        state.blobs().clone(),
        database,
        config.protocol.clone(),
    );

    let logged_in = other.account().login("bob", PASSWORD).await.unwrap();
    assert_eq!(logged_in.address(), account.address());

    let list = other.personal_storage().list(&logged_in).await.unwrap();
    assert_eq!(
        list.pods,
        vec![Pod {
            name: "photos".to_string(),
            index: 1
        }]
    );
}

#[tokio::test]
async fn test_duplicate_username_in_sqlite() {
    let (state, _, _temp) = setup_test_state().await;
    let fdp = state.fdp();

    fdp.account().register("carol", PASSWORD).await.unwrap();
    let result = fdp.account().register("carol", PASSWORD).await;

    assert!(matches!(result, Err(FdpError::DuplicateUsername(_))));
}
