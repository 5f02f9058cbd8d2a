/**
 * Account lifecycle: registration, login and
 *  identity derivation from a mnemonic.
 */
pub mod account;
/**
 * Response bodies for serving the protocol
 *  over HTTP.
 */
pub mod api;
pub mod client;
pub mod config;
/**
 * Cryptographic types and operations.
 *  - Mnemonic, key and address derivation
 *  - ENS-style namehashing
 *  - Password sealed secrets
 */
pub mod crypto;
/**
 * Directory trees inside an open pod.
 */
pub mod directory;
pub mod error;
/**
 * Internal wrapper around content addressing,
 *  renamed to something a little more down-to-earth.
 */
pub mod linked_data;
/**
 * The persisted wire format: root and
 *  directory manifests.
 */
pub mod manifest;
pub mod pod;
/**
 * The name registry seam: namehash to
 *  account record, with exclusive create
 *  and compare-and-swap pointer updates.
 */
pub mod registry;
/**
 * Content addressed storage. An in-memory
 *  map and a light wrapper around iroh-blobs.
 */
pub mod store;
/**
 * Bounded optimistic commits against an
 *  account's root manifest.
 */
pub mod sync;

pub mod prelude {
    pub use crate::account::{Account, IdentityManager};
    pub use crate::client::Fdp;
    pub use crate::config::Config;
    pub use crate::crypto::{Address, Mnemonic, NameHash, Wallet};
    pub use crate::directory::{DirectoryNode, DirectoryTree};
    pub use crate::error::FdpError;
    pub use crate::linked_data::{Cid, CidError, Link};
    pub use crate::manifest::NodeKind;
    pub use crate::pod::{Pod, PodList, PodRegistry};
    pub use crate::registry::{MemoryNameRegistry, NameRecord, NameRegistry, NameRegistryError};
    pub use crate::store::{BlobsStore, ContentStore, MemoryContentStore};
}
