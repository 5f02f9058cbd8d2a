//! Bounded optimistic commits against an account's root manifest.
//!
//! The root manifest is a single versioned object whose current version is
//! the pointer held in the account's name record. Every mutation, whether
//! it touches the pod list or a pod's directory tree, runs the same loop:
//!
//! 1. resolve the pointer and load the root manifest it names
//! 2. compute the next root manifest from it
//! 3. store the next manifest (and whatever blocks it references)
//! 4. compare-and-swap the pointer from the loaded link to the new one
//!
//! If the swap loses, the loop starts over from the fresh pointer, up to a
//! fixed number of attempts. The swap is always the last step, so a failed
//! or abandoned attempt leaves only unreferenced blocks in the store.
//!
//! This protects one account against interleaved writers. It is not a
//! linearizability guarantee: callers are still expected to issue
//! mutations for an account one at a time.

use std::future::Future;

use crate::crypto::NameHash;
use crate::error::FdpError;
use crate::linked_data::Link;
use crate::manifest::RootManifest;
use crate::registry::{NameRegistry, NameRegistryError};
use crate::store::ContentStore;

/// A root manifest together with the link it was loaded from
#[derive(Debug, Clone)]
pub struct RootSnapshot {
    pub link: Link,
    pub root: RootManifest,
}

/// Access to one account's root manifest.
#[derive(Debug, Clone)]
pub struct RootHandle<S, R> {
    store: S,
    registry: R,
    name_hash: NameHash,
    max_attempts: u32,
}

impl<S: ContentStore, R: NameRegistry> RootHandle<S, R> {
    pub fn new(store: S, registry: R, name_hash: NameHash, max_attempts: u32) -> Self {
        Self {
            store,
            registry,
            name_hash,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn name_hash(&self) -> &NameHash {
        &self.name_hash
    }

    /// Resolve the current pointer and load the manifest behind it
    pub async fn load(&self) -> Result<RootSnapshot, FdpError> {
        let record = self.registry.resolve(&self.name_hash).await?;
        let link = record.root_manifest_pointer;
        tracing::debug!(name_hash = %self.name_hash, %link, "loading root manifest");

        let root: RootManifest = self.store.get_block(&link).await?;
        root.validate()?;
        Ok(RootSnapshot { link, root })
    }

    /// Apply `mutate` to the latest root manifest and swap it in.
    ///
    /// `mutate` may run once per attempt, each time against a freshly
    /// loaded manifest, and must not have side effects beyond writing
    /// blocks to the store. Any error it returns aborts the commit
    /// immediately.
    pub async fn commit<T, F, Fut>(&self, mut mutate: F) -> Result<T, FdpError>
    where
        F: FnMut(RootManifest) -> Fut,
        Fut: Future<Output = Result<(RootManifest, T), FdpError>>,
    {
        for attempt in 1..=self.max_attempts {
            let RootSnapshot { link: old, root } = self.load().await?;

            let (mut next, value) = mutate(root).await?;
            next.advance(old);
            let new = self.store.put_block(&next).await?;

            match self
                .registry
                .update_pointer(&self.name_hash, &old, new)
                .await
            {
                Ok(()) => {
                    tracing::debug!(
                        name_hash = %self.name_hash,
                        %old,
                        %new,
                        height = next.height(),
                        "committed root manifest"
                    );
                    return Ok(value);
                }
                Err(NameRegistryError::PointerMismatch(expected, actual)) => {
                    tracing::warn!(
                        name_hash = %self.name_hash,
                        %expected,
                        %actual,
                        attempt,
                        max_attempts = self.max_attempts,
                        "root manifest moved during commit, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(FdpError::ConcurrentModification(self.max_attempts))
    }
}
