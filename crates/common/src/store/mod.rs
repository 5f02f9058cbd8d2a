//! The content-addressed store every manifest and file lives in.
//!
//! The store is an external collaborator: immutable, addressed by content,
//! with no notion of accounts. Two implementations ship here:
//!
//! - [`MemoryContentStore`]: a process-local map, for tests and ephemeral use
//! - [`BlobsStore`]: an iroh-blobs store, in memory or on disk

mod blobs;
mod memory;

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::linked_data::{BlockEncoded, CodecError, Link, LD_CBOR_CODEC};

pub use blobs::BlobsStore;
pub use memory::MemoryContentStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("content not found: {0}")]
    NotFound(Link),
    #[error("link is not a blake3 content address: {0}")]
    UnsupportedLink(Link),
    #[error("content does not match its address: {0}")]
    Corrupted(Link),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

#[async_trait]
pub trait ContentStore: Send + Sync + Debug + Clone + 'static {
    /// Store bytes under `codec` and return their address.
    ///
    /// Storing the same bytes twice is a no-op that returns the same link.
    async fn put(&self, codec: u64, data: Bytes) -> Result<Link, StoreError>;

    /// Fetch the bytes behind `link`.
    async fn get(&self, link: &Link) -> Result<Bytes, StoreError>;

    async fn has(&self, link: &Link) -> Result<bool, StoreError>;

    /// Encode and store a DAG-CBOR block
    async fn put_block<T>(&self, block: &T) -> Result<Link, StoreError>
    where
        T: BlockEncoded + Sync,
    {
        let data = block.encode()?;
        self.put(LD_CBOR_CODEC, Bytes::from(data)).await
    }

    /// Fetch and decode a DAG-CBOR block
    async fn get_block<T>(&self, link: &Link) -> Result<T, StoreError>
    where
        T: BlockEncoded + Send,
    {
        let data = self.get(link).await?;
        Ok(T::decode(&data)?)
    }
}
