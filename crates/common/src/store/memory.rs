use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::{ContentStore, StoreError};
use crate::linked_data::Link;

/// In-memory content store keyed by link
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    inner: Arc<RwLock<HashMap<Link, Bytes>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blocks held
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, codec: u64, data: Bytes) -> Result<Link, StoreError> {
        let link = Link::for_content(codec, &data);
        tracing::debug!(%link, size = data.len(), "storing block");
        self.inner.write().entry(link).or_insert(data);
        Ok(link)
    }

    async fn get(&self, link: &Link) -> Result<Bytes, StoreError> {
        let data = self
            .inner
            .read()
            .get(link)
            .cloned()
            .ok_or(StoreError::NotFound(*link))?;
        if !link.verify(&data) {
            return Err(StoreError::Corrupted(*link));
        }
        Ok(data)
    }

    async fn has(&self, link: &Link) -> Result<bool, StoreError> {
        Ok(self.inner.read().contains_key(link))
    }
}
