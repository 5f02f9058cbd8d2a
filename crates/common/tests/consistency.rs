//! Integration tests for the commit discipline shared by every client:
//! compare-and-swap retries, convergence, and the manifest wire format.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use ::common::crypto::NameHash;
use ::common::linked_data::{BlockEncoded, Link};
use ::common::manifest::{DirectoryManifest, ManifestError, RootManifest};
use ::common::prelude::*;
use ::common::registry::MemoryNameRegistryError;

/// A registry that lets another writer slip in before some pointer
/// updates, so the caller's compare-and-swap loses.
#[derive(Debug, Clone)]
struct InterferingRegistry {
    inner: MemoryNameRegistry,
    store: MemoryContentStore,
    /// Remaining pointer updates to interfere with
    remaining: Arc<AtomicU32>,
    /// Pointer updates seen, including lost ones
    updates: Arc<AtomicU32>,
}

impl InterferingRegistry {
    fn new(store: MemoryContentStore, interferences: u32) -> Self {
        Self {
            inner: MemoryNameRegistry::new(),
            store,
            remaining: Arc::new(AtomicU32::new(interferences)),
            updates: Arc::new(AtomicU32::new(0)),
        }
    }

    fn updates(&self) -> u32 {
        self.updates.load(Ordering::SeqCst)
    }

    /// Commit a pod named `intruder-<n>` behind the caller's back
    async fn intrude(&self, name_hash: &NameHash) {
        let record = self.inner.resolve(name_hash).await.unwrap();
        let old = record.root_manifest_pointer;
        let mut root: RootManifest = self.store.get_block(&old).await.unwrap();

        let name = format!("intruder-{}", root.next_pod_index());
        let directory = self
            .store
            .put_block(&DirectoryManifest::new(&name))
            .await
            .unwrap();
        root.add_pod(name, directory);
        root.advance(old);

        let new = self.store.put_block(&root).await.unwrap();
        self.inner.update_pointer(name_hash, &old, new).await.unwrap();
    }
}

#[async_trait]
impl NameRegistry for InterferingRegistry {
    type Error = MemoryNameRegistryError;

    async fn resolve(
        &self,
        name_hash: &NameHash,
    ) -> Result<NameRecord, NameRegistryError<Self::Error>> {
        self.inner.resolve(name_hash).await
    }

    async fn register(
        &self,
        name_hash: NameHash,
        record: NameRecord,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        self.inner.register(name_hash, record).await
    }

    async fn update_pointer(
        &self,
        name_hash: &NameHash,
        old: &Link,
        new: Link,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let interfere = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if interfere {
            self.intrude(name_hash).await;
        }
        self.inner.update_pointer(name_hash, old, new).await
    }
}

/// A registry whose pointer updates fail for reasons other than a lost swap
#[derive(Debug, Clone, Default)]
struct BrokenRegistry {
    inner: MemoryNameRegistry,
    updates: Arc<AtomicU32>,
}

#[async_trait]
impl NameRegistry for BrokenRegistry {
    type Error = MemoryNameRegistryError;

    async fn resolve(
        &self,
        name_hash: &NameHash,
    ) -> Result<NameRecord, NameRegistryError<Self::Error>> {
        self.inner.resolve(name_hash).await
    }

    async fn register(
        &self,
        name_hash: NameHash,
        record: NameRecord,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        self.inner.register(name_hash, record).await
    }

    async fn update_pointer(
        &self,
        _name_hash: &NameHash,
        _old: &Link,
        _new: Link,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Err(NameRegistryError::Provider(
            MemoryNameRegistryError::Internal("registry offline".to_string()),
        ))
    }
}

/// A registry whose existence check misses records, as if another client
/// registered the same name between the check and the create
#[derive(Debug, Clone)]
struct RacingRegistry {
    inner: MemoryNameRegistry,
}

#[async_trait]
impl NameRegistry for RacingRegistry {
    type Error = MemoryNameRegistryError;

    async fn resolve(
        &self,
        name_hash: &NameHash,
    ) -> Result<NameRecord, NameRegistryError<Self::Error>> {
        self.inner.resolve(name_hash).await
    }

    async fn register(
        &self,
        name_hash: NameHash,
        record: NameRecord,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        self.inner.register(name_hash, record).await
    }

    async fn update_pointer(
        &self,
        name_hash: &NameHash,
        old: &Link,
        new: Link,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        self.inner.update_pointer(name_hash, old, new).await
    }

    async fn exists(&self, _name_hash: &NameHash) -> Result<bool, NameRegistryError<Self::Error>> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_lost_swap_is_retried() {
    common::init_tracing();
    let store = MemoryContentStore::new();
    let registry = InterferingRegistry::new(store.clone(), 1);
    let fdp = Fdp::new(store, registry.clone(), Config::default());

    let account = fdp
        .account()
        .register(&common::unique_name("retry"), common::PASSWORD)
        .await
        .unwrap();
    let pod = fdp
        .personal_storage()
        .create(&account, "mine")
        .await
        .unwrap();

    // the intruder's pod landed first, ours was appended after a re-read
    assert_eq!(pod.index, 2);
    assert_eq!(registry.updates(), 2);

    let list = fdp.personal_storage().list(&account).await.unwrap();
    let names: Vec<_> = list.pods.iter().map(|pod| pod.name.as_str()).collect();
    assert_eq!(names, vec!["intruder-1", "mine"]);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    common::init_tracing();
    let store = MemoryContentStore::new();
    let registry = InterferingRegistry::new(store.clone(), u32::MAX);
    let fdp = Fdp::new(store, registry.clone(), Config::default());

    let account = fdp
        .account()
        .register(&common::unique_name("bounded"), common::PASSWORD)
        .await
        .unwrap();
    let result = fdp.personal_storage().create(&account, "mine").await;

    assert!(matches!(result, Err(FdpError::ConcurrentModification(3))));
    assert_eq!(registry.updates(), 3);

    // nothing of the failed commit is reachable
    let list = fdp.personal_storage().list(&account).await.unwrap();
    assert!(list.pods.iter().all(|pod| pod.name != "mine"));
    assert_eq!(list.pods.len(), 3);
}

#[tokio::test]
async fn test_attempt_bound_is_configurable() {
    common::init_tracing();
    let store = MemoryContentStore::new();
    let registry = InterferingRegistry::new(store.clone(), 4);
    let config = Config {
        max_commit_attempts: 5,
        ..Config::default()
    };
    let fdp = Fdp::new(store, registry.clone(), config);

    let account = fdp
        .account()
        .register(&common::unique_name("patient"), common::PASSWORD)
        .await
        .unwrap();
    let pod = fdp
        .personal_storage()
        .create(&account, "mine")
        .await
        .unwrap();

    assert_eq!(pod.index, 5);
    assert_eq!(registry.updates(), 5);
}

#[tokio::test]
async fn test_directory_commits_retry_too() {
    common::init_tracing();
    let store = MemoryContentStore::new();
    let registry = InterferingRegistry::new(store.clone(), 0);
    let fdp = Fdp::new(store, registry.clone(), Config::default());

    let account = fdp
        .account()
        .register(&common::unique_name("dirs"), common::PASSWORD)
        .await
        .unwrap();
    fdp.personal_storage()
        .create(&account, "pod")
        .await
        .unwrap();
    let tree = fdp
        .directory(&account, "pod", common::PASSWORD)
        .await
        .unwrap();

    registry.remaining.store(1, Ordering::SeqCst);
    tree.create("/kept").await.unwrap();

    // both the intruder's pod and our directory survive
    let list = fdp.personal_storage().list(&account).await.unwrap();
    assert_eq!(list.pods.len(), 2);
    assert_eq!(tree.list("/").await.unwrap()[0].name, "kept");
}

#[tokio::test]
async fn test_other_registry_errors_are_not_retried() {
    common::init_tracing();
    let store = MemoryContentStore::new();
    let registry = BrokenRegistry::default();
    let fdp = Fdp::new(store, registry.clone(), Config::default());

    let account = fdp
        .account()
        .register(&common::unique_name("broken"), common::PASSWORD)
        .await
        .unwrap();
    let result = fdp.personal_storage().create(&account, "pod").await;

    assert!(matches!(result, Err(FdpError::Registry(_))));
    assert_eq!(registry.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clients_converge() {
    let (a, store, registry) = common::setup_test_env();
    let b = common::second_client(&store, &registry);
    let account_a = common::setup_account(&a).await;
    let account_b = b
        .account()
        .login(account_a.username(), common::PASSWORD)
        .await
        .unwrap();

    // alternate writers, one mutation at a time
    a.personal_storage().create(&account_a, "p1").await.unwrap();
    b.personal_storage().create(&account_b, "p2").await.unwrap();
    let tree_a = a.directory(&account_a, "p1", common::PASSWORD).await.unwrap();
    let tree_b = b.directory(&account_b, "p1", common::PASSWORD).await.unwrap();
    tree_a.create("/d2").await.unwrap();
    tree_b.create("/d1").await.unwrap();
    tree_a.create("/d1/s1").await.unwrap();
    tree_b
        .upload("/d1/notes.md", Bytes::from_static(b"# notes"))
        .await
        .unwrap();

    assert_eq!(
        a.personal_storage().list(&account_a).await.unwrap(),
        b.personal_storage().list(&account_b).await.unwrap()
    );
    for path in ["/", "/d1", "/d2"] {
        assert_eq!(
            tree_a.list(path).await.unwrap(),
            tree_b.list(path).await.unwrap()
        );
    }

    let d1 = tree_a.list("/d1").await.unwrap();
    let names: Vec<_> = d1.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["notes.md", "s1"]);
}

#[tokio::test]
async fn test_root_manifest_history() {
    let (fdp, store, _registry) = common::setup_test_env();
    let account = common::setup_account(&fdp).await;
    let genesis = fdp.account().pointer(account.username()).await.unwrap();

    fdp.personal_storage().create(&account, "p").await.unwrap();
    let head = fdp.account().pointer(account.username()).await.unwrap();
    assert_ne!(head, genesis);

    let root: RootManifest = store.get_block(&head).await.unwrap();
    assert_eq!(root.height(), 1);
    assert_eq!(root.previous(), Some(&genesis));
    assert!(root.shared_pods().is_empty());

    let first: RootManifest = store.get_block(&genesis).await.unwrap();
    assert_eq!(first.height(), 0);
    assert!(first.pods().is_empty());
}

#[tokio::test]
async fn test_root_manifest_round_trip() {
    let (fdp, store, registry) = common::setup_test_env();
    let account = common::setup_account(&fdp).await;
    fdp.personal_storage().create(&account, "x").await.unwrap();
    fdp.personal_storage().create(&account, "y").await.unwrap();

    let head = registry
        .resolve(account.name_hash())
        .await
        .unwrap()
        .root_manifest_pointer;
    let bytes = store.get(&head).await.unwrap();

    // any decoder sees the same pods, and re-encoding is byte identical
    let root = RootManifest::decode(&bytes).unwrap();
    let pods: Vec<_> = root
        .pods()
        .iter()
        .map(|pod| (pod.name.as_str(), pod.index))
        .collect();
    assert_eq!(pods, vec![("x", 1), ("y", 2)]);
    assert_eq!(root.encode().unwrap(), bytes.to_vec());
    assert_eq!(Link::for_content(head.codec(), &bytes), head);
}

#[test]
fn test_unknown_manifest_fields_are_rejected() {
    #[derive(serde::Serialize)]
    struct Extended {
        version: u64,
        pod: String,
        entries: Vec<()>,
        surprise: bool,
    }

    let encoded = serde_ipld_dagcbor::to_vec(&Extended {
        version: 1,
        pod: "p".to_string(),
        entries: vec![],
        surprise: true,
    })
    .unwrap();

    assert!(DirectoryManifest::decode(&encoded).is_err());
}

#[tokio::test]
async fn test_unsupported_manifest_version_fails_closed() {
    #[derive(serde::Serialize)]
    struct NextVersion {
        version: u64,
        pod: String,
        entries: Vec<()>,
    }

    let (fdp, store, registry) = common::setup_test_env();
    let account = common::setup_account(&fdp).await;
    fdp.personal_storage().create(&account, "p").await.unwrap();

    // swap a version 2 directory manifest in for the pod
    let head = registry
        .resolve(account.name_hash())
        .await
        .unwrap()
        .root_manifest_pointer;
    let mut root: RootManifest = store.get_block(&head).await.unwrap();
    let next = serde_ipld_dagcbor::to_vec(&NextVersion {
        version: 2,
        pod: "p".to_string(),
        entries: vec![],
    })
    .unwrap();
    let next_link = store
        .put(::common::linked_data::LD_CBOR_CODEC, Bytes::from(next))
        .await
        .unwrap();
    root.set_directory("p", next_link);
    root.advance(head);
    let new_head = store.put_block(&root).await.unwrap();
    registry
        .update_pointer(account.name_hash(), &head, new_head)
        .await
        .unwrap();

    let tree = fdp.directory(&account, "p", common::PASSWORD).await.unwrap();
    assert!(matches!(
        tree.list("/").await,
        Err(FdpError::Manifest(_))
    ));
}

#[tokio::test]
async fn test_registration_race_is_decided_by_registry() {
    let (fdp, store, registry) = common::setup_test_env();
    let first = fdp
        .account()
        .register("racer", common::PASSWORD)
        .await
        .unwrap();
    let before = registry.resolve(first.name_hash()).await.unwrap();

    let racing = Fdp::new(
        store.clone(),
        RacingRegistry {
            inner: registry.clone(),
        },
        Config::default(),
    );
    let result = racing.account().register("racer", "another password").await;

    assert!(matches!(result, Err(FdpError::DuplicateUsername(name)) if name == "racer"));
    assert_eq!(registry.resolve(first.name_hash()).await.unwrap(), before);

    let logged_in = fdp
        .account()
        .login("racer", common::PASSWORD)
        .await
        .unwrap();
    assert_eq!(logged_in.address(), first.address());
}

#[tokio::test]
async fn test_directory_manifest_for_another_pod_is_rejected() {
    let (fdp, store, registry) = common::setup_test_env();
    let account = common::setup_account(&fdp).await;
    fdp.personal_storage().create(&account, "a").await.unwrap();
    fdp.personal_storage().create(&account, "b").await.unwrap();
    let tree = fdp
        .directory(&account, "a", common::PASSWORD)
        .await
        .unwrap();

    // point pod a at pod b's directory manifest
    let old = fdp.account().pointer(account.username()).await.unwrap();
    let mut root: RootManifest = store.get_block(&old).await.unwrap();
    let b = *root.directory("b").unwrap();
    root.set_directory("a", b);
    root.advance(old);
    let new = store.put_block(&root).await.unwrap();
    registry
        .update_pointer(account.name_hash(), &old, new)
        .await
        .unwrap();

    assert!(matches!(
        tree.list("/").await,
        Err(FdpError::Manifest(ManifestError::Malformed(_)))
    ));
    assert!(matches!(
        tree.create("/d").await,
        Err(FdpError::Manifest(ManifestError::Malformed(_)))
    ));
}
