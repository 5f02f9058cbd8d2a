//! Shared test utilities for account, pod and directory integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use common::prelude::*;
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse battery staple";

/// Fixed mnemonic with a well known derivation
pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub type MemoryFdp = Fdp<MemoryContentStore, MemoryNameRegistry>;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A name no other test in this process uses
pub fn unique_name(prefix: &str) -> String {
    format!("{}{}", prefix, COUNTER.fetch_add(1, Ordering::Relaxed))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Set up a client over a fresh in-memory store and registry
pub fn setup_test_env() -> (MemoryFdp, MemoryContentStore, MemoryNameRegistry) {
    init_tracing();
    let store = MemoryContentStore::new();
    let registry = MemoryNameRegistry::new();
    let fdp = Fdp::new(store.clone(), registry.clone(), Config::default());
    (fdp, store, registry)
}

/// Another independent client sharing only the store and the registry
pub fn second_client(store: &MemoryContentStore, registry: &MemoryNameRegistry) -> MemoryFdp {
    Fdp::new(store.clone(), registry.clone(), Config::default())
}

/// Register a fresh account
pub async fn setup_account(fdp: &MemoryFdp) -> Account {
    fdp.account()
        .register(&unique_name("user"), PASSWORD)
        .await
        .unwrap()
}

/// Register a fresh account, create a pod and open it
pub async fn setup_pod(
    fdp: &MemoryFdp,
) -> (Account, DirectoryTree<MemoryContentStore, MemoryNameRegistry>) {
    let account = setup_account(fdp).await;
    let pod = unique_name("pod");
    fdp.personal_storage().create(&account, &pod).await.unwrap();
    let tree = fdp.directory(&account, &pod, PASSWORD).await.unwrap();
    (account, tree)
}

/// Set up a client over an iroh-blobs store on disk
pub async fn setup_blobs_env() -> (Fdp<BlobsStore, MemoryNameRegistry>, TempDir) {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let blobs = BlobsStore::fs(&temp_dir.path().join("blobs")).await.unwrap();
    let fdp = Fdp::new(blobs, MemoryNameRegistry::new(), Config::default());
    (fdp, temp_dir)
}
