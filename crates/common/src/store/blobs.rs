use std::future::IntoFuture;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use iroh_blobs::{
    api::blobs::{BlobStatus, Blobs},
    store::{fs::FsStore, mem::MemStore},
    BlobsProtocol, Hash,
};

use super::{ContentStore, StoreError};
use crate::linked_data::Link;

/// Content store over a local iroh-blobs store.
///
/// iroh-blobs addresses content by its BLAKE3 hash, which is exactly the
/// digest inside our links, so a link maps onto a blob hash without any
/// side index. The codec half of the link is not stored; callers always
/// know which codec they expect.
#[derive(Clone, Debug)]
pub struct BlobsStore {
    pub inner: Arc<BlobsProtocol>,
}

impl Deref for BlobsStore {
    type Target = Arc<BlobsProtocol>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl BlobsStore {
    /// Load a blob store persisted at `path`
    pub async fn fs(path: &Path) -> Result<Self, StoreError> {
        tracing::debug!("BlobsStore::fs called with path: {:?}", path);
        let store = FsStore::load(path)
            .await
            .map_err(|e| StoreError::Default(anyhow!(e)))?;
        let blobs = BlobsProtocol::new(&store, None);
        Ok(Self {
            inner: Arc::new(blobs),
        })
    }

    /// Create an ephemeral in-memory blob store
    pub async fn memory() -> Result<Self, StoreError> {
        let store = MemStore::new();
        let blobs = BlobsProtocol::new(&store, None);
        Ok(Self {
            inner: Arc::new(blobs),
        })
    }

    /// Get a handle to the underlying blobs client against
    ///  the store
    pub fn blobs(&self) -> &Blobs {
        self.inner.store().blobs()
    }

    fn hash_for(link: &Link) -> Result<Hash, StoreError> {
        link.digest()
            .map(Hash::from_bytes)
            .ok_or(StoreError::UnsupportedLink(*link))
    }

    async fn is_complete(&self, hash: Hash) -> Result<bool, StoreError> {
        let status = self
            .blobs()
            .status(hash)
            .await
            .map_err(|err| StoreError::Default(anyhow!(err)))?;
        Ok(matches!(status, BlobStatus::Complete { .. }))
    }
}

#[async_trait]
impl ContentStore for BlobsStore {
    async fn put(&self, codec: u64, data: Bytes) -> Result<Link, StoreError> {
        let size = data.len();
        let hash = self
            .blobs()
            .add_bytes(data)
            .into_future()
            .await
            .map_err(|e| StoreError::Default(anyhow!(e)))?
            .hash;
        let link = Link::new(codec, blake3::Hash::from_bytes(*hash.as_bytes()));
        tracing::debug!(%link, size, "stored blob");
        Ok(link)
    }

    async fn get(&self, link: &Link) -> Result<Bytes, StoreError> {
        let hash = Self::hash_for(link)?;
        if !self.is_complete(hash).await? {
            return Err(StoreError::NotFound(*link));
        }
        let data = self
            .blobs()
            .get_bytes(hash)
            .await
            .map_err(|e| StoreError::Default(anyhow!(e)))?;
        Ok(data)
    }

    async fn has(&self, link: &Link) -> Result<bool, StoreError> {
        let hash = Self::hash_for(link)?;
        self.is_complete(hash).await
    }
}
