//! # Manifests
//!
//! The persisted state of an account is a small DAG of DAG-CBOR blocks:
//!
//! ```text
//! NameRecord.root_manifest_pointer
//!        |
//!   RootManifest --previous--> RootManifest --> ...
//!        |
//!        +-- credentials (sealed mnemonic)
//!        +-- pods: [{name, index}]
//!        +-- directories: pod name --> DirectoryManifest
//!                                         |
//!                                         +-- entries: [{path, kind, times, content?}]
//! ```
//!
//! These blocks are the cross-client wire format. Field names and types
//! are fixed, decoding rejects unknown fields and unknown format versions,
//! and every mutation produces a fresh root manifest whose link is swapped
//! into the registry record.

mod directory;
mod root;

pub use directory::{DirectoryEntry, DirectoryManifest, FileContent, NodeKind};
pub use root::{Credentials, Pod, RootManifest};

/// The only manifest format version this crate reads or writes
pub const MANIFEST_VERSION: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("unsupported manifest version {0}, expected {MANIFEST_VERSION}")]
    UnsupportedVersion(u64),
    #[error("malformed manifest: {0}")]
    Malformed(String),
}
