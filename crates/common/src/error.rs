use std::fmt::Display;

use crate::crypto::{IdentityError, SecretError};
use crate::linked_data::CodecError;
use crate::manifest::ManifestError;
use crate::registry::NameRegistryError;
use crate::store::StoreError;

/// Every error an account, pod or directory operation can surface.
///
/// Each operation either returns a fully populated result or exactly one
/// of these. A failed mutation never leaves a reachable trace in the name
/// registry.
#[derive(Debug, thiserror::Error)]
pub enum FdpError {
    #[error("username {0} is already registered")]
    DuplicateUsername(String),
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("no registry record for {0}")]
    NotFoundRegistryRecord(String),
    #[error("pod {0} already exists")]
    DuplicatePod(String),
    #[error("pod {0} not found")]
    PodNotFound(String),
    #[error("parent directory of {0} not found")]
    ParentNotFound(String),
    #[error("path {0} already exists")]
    PathAlreadyExists(String),
    #[error("path {0} not found")]
    NotFound(String),
    /// Every commit attempt lost its compare-and-swap
    #[error("root manifest changed concurrently, gave up after {0} attempts")]
    ConcurrentModification(u32),

    #[error("invalid username: {0}")]
    InvalidUsername(String),
    #[error("invalid pod name: {0}")]
    InvalidPodName(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("{0} is not a file")]
    NotAFile(String),
    #[error("directory {0} is not empty")]
    DirectoryNotEmpty(String),

    #[error("name registry error: {0}")]
    Registry(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

impl<T: Display> From<NameRegistryError<T>> for FdpError {
    fn from(err: NameRegistryError<T>) -> Self {
        match err {
            NameRegistryError::NotFound(name_hash) => {
                FdpError::NotFoundRegistryRecord(name_hash.to_string())
            }
            NameRegistryError::AlreadyExists(name_hash) => {
                FdpError::DuplicateUsername(name_hash.to_string())
            }
            other => FdpError::Registry(other.to_string()),
        }
    }
}
