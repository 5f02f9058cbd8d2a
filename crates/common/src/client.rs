use crate::account::{Account, IdentityManager};
use crate::config::Config;
use crate::directory::DirectoryTree;
use crate::error::FdpError;
use crate::pod::PodRegistry;
use crate::registry::NameRegistry;
use crate::store::ContentStore;

/// A protocol client over a content store and a name registry.
///
/// Clients keep no state between calls beyond their collaborators, so any
/// number of them (in one process or not) can operate on the same
/// accounts as long as they share the store, the registry and the
/// protocol [`Config`].
#[derive(Debug, Clone)]
pub struct Fdp<S, R> {
    identity: IdentityManager<S, R>,
    pods: PodRegistry<S, R>,
    config: Config,
}

impl<S: ContentStore, R: NameRegistry> Fdp<S, R> {
    pub fn new(store: S, registry: R, config: Config) -> Self {
        let identity = IdentityManager::new(store, registry, config.clone());
        let pods = PodRegistry::new(identity.clone());
        Self {
            identity,
            pods,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registration and login
    pub fn account(&self) -> &IdentityManager<S, R> {
        &self.identity
    }

    /// Pod creation, listing and opening
    pub fn personal_storage(&self) -> &PodRegistry<S, R> {
        &self.pods
    }

    /// Open `pod` for directory operations
    pub async fn directory(
        &self,
        account: &Account,
        pod: &str,
        password: &str,
    ) -> Result<DirectoryTree<S, R>, FdpError> {
        self.pods.open(account, pod, password).await
    }
}
