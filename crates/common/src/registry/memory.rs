use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{NameRecord, NameRegistry, NameRegistryError};
use crate::crypto::NameHash;
use crate::linked_data::Link;

/// In-memory name registry backed by a HashMap
#[derive(Debug, Clone, Default)]
pub struct MemoryNameRegistry {
    inner: Arc<RwLock<HashMap<NameHash, NameRecord>>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryNameRegistryError {
    #[error("memory registry error: {0}")]
    Internal(String),
}

impl MemoryNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered records
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(e: impl std::fmt::Display) -> NameRegistryError<MemoryNameRegistryError> {
    NameRegistryError::Provider(MemoryNameRegistryError::Internal(format!(
        "failed to acquire lock: {}",
        e
    )))
}

#[async_trait]
impl NameRegistry for MemoryNameRegistry {
    type Error = MemoryNameRegistryError;

    async fn resolve(
        &self,
        name_hash: &NameHash,
    ) -> Result<NameRecord, NameRegistryError<Self::Error>> {
        let inner = self.inner.read().map_err(poisoned)?;

        inner
            .get(name_hash)
            .cloned()
            .ok_or(NameRegistryError::NotFound(*name_hash))
    }

    async fn register(
        &self,
        name_hash: NameHash,
        record: NameRecord,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        if inner.contains_key(&name_hash) {
            return Err(NameRegistryError::AlreadyExists(name_hash));
        }
        inner.insert(name_hash, record);
        Ok(())
    }

    async fn update_pointer(
        &self,
        name_hash: &NameHash,
        old: &Link,
        new: Link,
    ) -> Result<(), NameRegistryError<Self::Error>> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        let record = inner
            .get_mut(name_hash)
            .ok_or(NameRegistryError::NotFound(*name_hash))?;

        if record.root_manifest_pointer != *old {
            return Err(NameRegistryError::PointerMismatch(
                *old,
                record.root_manifest_pointer,
            ));
        }
        record.root_manifest_pointer = new;
        Ok(())
    }
}
