//! Pods: an account's append-only list of storage containers.
//!
//! The pod list lives in the root manifest. Creating a pod appends
//! `{name, index = max + 1}` and links an empty directory manifest for it,
//! both in one commit.

use crate::account::{unlock, Account, IdentityManager};
use crate::directory::DirectoryTree;
use crate::error::FdpError;
use crate::manifest::DirectoryManifest;
use crate::registry::NameRegistry;
use crate::store::ContentStore;

pub use crate::manifest::Pod;

/// Result of listing an account's pods
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodList {
    /// Owned pods by index ascending
    pub pods: Vec<Pod>,
    /// Pods shared with the account. Always empty.
    pub shared_pods: Vec<Pod>,
}

pub fn validate_pod_name(name: &str) -> Result<(), FdpError> {
    if name.is_empty() {
        return Err(FdpError::InvalidPodName("pod name is empty".to_string()));
    }
    if name.contains('/') {
        return Err(FdpError::InvalidPodName(format!("{} contains '/'", name)));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PodRegistry<S, R> {
    identity: IdentityManager<S, R>,
}

impl<S: ContentStore, R: NameRegistry> PodRegistry<S, R> {
    pub fn new(identity: IdentityManager<S, R>) -> Self {
        Self { identity }
    }

    /// Create a pod with the next free index
    pub async fn create(&self, account: &Account, name: &str) -> Result<Pod, FdpError> {
        validate_pod_name(name)?;
        let handle = self.identity.root(*account.name_hash());

        let pod = handle
            .commit(|mut root| {
                let store = handle.store().clone();
                async move {
                    if root.get_pod(name).is_some() {
                        return Err(FdpError::DuplicatePod(name.to_string()));
                    }
                    let directory = store.put_block(&DirectoryManifest::new(name)).await?;
                    let pod = root.add_pod(name.to_string(), directory);
                    Ok((root, pod))
                }
            })
            .await?;

        tracing::info!(
            username = account.username(),
            pod = %pod.name,
            index = pod.index,
            "created pod"
        );
        Ok(pod)
    }

    pub async fn list(&self, account: &Account) -> Result<PodList, FdpError> {
        let snapshot = self.identity.root(*account.name_hash()).load().await?;
        let mut pods = snapshot.root.pods().to_vec();
        pods.sort_by_key(|pod| pod.index);
        Ok(PodList {
            pods,
            shared_pods: snapshot.root.shared_pods().to_vec(),
        })
    }

    pub async fn exists(&self, account: &Account, name: &str) -> Result<bool, FdpError> {
        let snapshot = self.identity.root(*account.name_hash()).load().await?;
        Ok(snapshot.root.get_pod(name).is_some())
    }

    /// Open a pod for directory operations.
    ///
    /// The password is checked against the sealed credentials before the
    /// pod is looked up.
    pub async fn open(
        &self,
        account: &Account,
        name: &str,
        password: &str,
    ) -> Result<DirectoryTree<S, R>, FdpError> {
        let handle = self.identity.root(*account.name_hash());
        let snapshot = handle.load().await?;

        unlock(&snapshot.root, password)?;

        let pod = snapshot
            .root
            .get_pod(name)
            .cloned()
            .ok_or_else(|| FdpError::PodNotFound(name.to_string()))?;

        tracing::debug!(username = account.username(), pod = %pod.name, "opened pod");
        Ok(DirectoryTree::new(handle, pod))
    }
}
