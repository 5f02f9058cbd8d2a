//! Content addressing for manifests and file data.
//!
//! Everything the protocol persists lives in a content-addressed store and
//! is referenced by a [`Link`]: a CIDv1 whose multihash is BLAKE3-256.
//! Manifests are DAG-CBOR blocks ([`LD_CBOR_CODEC`]), file contents are raw
//! bytes ([`LD_RAW_CODEC`]).

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use cid::Cid;
pub use cid::Error as CidError;

/// Multicodec for raw binary data
pub const LD_RAW_CODEC: u64 = 0x55;
/// Multicodec for DAG-CBOR encoded blocks
pub const LD_CBOR_CODEC: u64 = 0x71;
/// Multihash code for BLAKE3-256
pub const BLAKE3_HASH_CODE: u64 = 0x1e;
/// Size of a BLAKE3 digest in bytes
pub const BLAKE3_HASH_SIZE: usize = 32;

type Multihash = multihash::Multihash<64>;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode block: {0}")]
    Encode(String),
    #[error("failed to decode block: {0}")]
    Decode(String),
}

/// A content address: CIDv1 over a BLAKE3-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(Cid);

impl Link {
    /// Build a link for content with the given codec and BLAKE3 digest.
    pub fn new(codec: u64, hash: blake3::Hash) -> Self {
        let mh = Multihash::wrap(BLAKE3_HASH_CODE, hash.as_bytes())
            .expect("a 32 byte digest always fits a 64 byte multihash");
        Link(Cid::new_v1(codec, mh))
    }

    /// Address the given bytes under the given codec.
    pub fn for_content(codec: u64, data: &[u8]) -> Self {
        Self::new(codec, blake3::hash(data))
    }

    pub fn codec(&self) -> u64 {
        self.0.codec()
    }

    /// The BLAKE3 digest this link points at.
    ///
    /// Returns `None` for CIDs produced by some other hash function; such
    /// links are never minted here and are rejected by the stores.
    pub fn digest(&self) -> Option<[u8; BLAKE3_HASH_SIZE]> {
        let mh = self.0.hash();
        if mh.code() != BLAKE3_HASH_CODE {
            return None;
        }
        mh.digest().try_into().ok()
    }

    /// Check that `data` is the content this link addresses.
    pub fn verify(&self, data: &[u8]) -> bool {
        *self == Self::for_content(self.codec(), data)
    }

    pub fn cid(&self) -> &Cid {
        &self.0
    }
}

impl From<Cid> for Link {
    fn from(cid: Cid) -> Self {
        Link(cid)
    }
}

impl From<Link> for Cid {
    fn from(link: Link) -> Self {
        link.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

impl FromStr for Link {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Link(Cid::try_from(s)?))
    }
}

/// Types persisted as DAG-CBOR blocks.
///
/// DAG-CBOR sorts map keys canonically, so two writers encoding the same
/// value produce identical bytes and therefore identical links.
pub trait BlockEncoded: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
