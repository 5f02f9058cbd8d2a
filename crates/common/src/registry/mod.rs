//! The name registry: namehash -> account record.
//!
//! The registry is the only mutable shared state in the protocol. Records
//! are created once (exclusive create) and afterwards only their root
//! manifest pointer moves, always through a compare-and-swap. Everything
//! else is immutable content in the store.

mod memory;

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::{Address, NameHash};
use crate::linked_data::Link;

pub use memory::{MemoryNameRegistry, MemoryNameRegistryError};

/// An account's entry in the name registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameRecord {
    /// Account address derived from the mnemonic
    pub address: Address,
    /// Uncompressed secp256k1 public key, hex without `0x`
    pub public_key: String,
    /// Link to the account's current root manifest
    pub root_manifest_pointer: Link,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameRegistryError<T> {
    #[error("unhandled name registry provider error: {0}")]
    Provider(#[from] T),
    /// No record exists under the namehash
    #[error("no record for {0}")]
    NotFound(NameHash),
    /// Exclusive create hit an existing record
    #[error("record already exists for {0}")]
    AlreadyExists(NameHash),
    /// The pointer moved since the caller read it --
    ///  expected, actual
    #[error("pointer mismatch: expected {0}, found {1}")]
    PointerMismatch(Link, Link),
}

#[async_trait]
pub trait NameRegistry: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send;

    /// Look up the record stored under `name_hash`
    async fn resolve(&self, name_hash: &NameHash)
        -> Result<NameRecord, NameRegistryError<Self::Error>>;

    /// Create a record. Must fail with `AlreadyExists` if any record is
    ///  already stored under `name_hash`, and must never overwrite it.
    async fn register(
        &self,
        name_hash: NameHash,
        record: NameRecord,
    ) -> Result<(), NameRegistryError<Self::Error>>;

    /// Atomically move the record's root manifest pointer from `old` to
    ///  `new`.
    ///
    /// Should fail with the following errors to be considered
    ///  correct:
    /// * `Err(NameRegistryError::NotFound)` - no record under `name_hash`
    /// * `Err(NameRegistryError::PointerMismatch)` - the current pointer is not `old`;
    ///     the record is left untouched
    async fn update_pointer(
        &self,
        name_hash: &NameHash,
        old: &Link,
        new: Link,
    ) -> Result<(), NameRegistryError<Self::Error>>;

    /// Check whether a record exists
    async fn exists(&self, name_hash: &NameHash) -> Result<bool, NameRegistryError<Self::Error>> {
        match self.resolve(name_hash).await {
            Ok(_) => Ok(true),
            Err(NameRegistryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
