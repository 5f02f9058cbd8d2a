use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::identity::keccak256;

pub const NAME_HASH_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
#[error("invalid name hash: {0}")]
pub struct NameHashError(String);

/// ENS-style namehash, the lookup key of the name registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameHash([u8; NAME_HASH_SIZE]);

impl NameHash {
    /// Hash a dotted name, e.g. `alice.fds`.
    ///
    /// Labels are lowercased before hashing; the empty name hashes to zero.
    pub fn of(name: &str) -> Self {
        let mut node = [0u8; NAME_HASH_SIZE];
        if name.is_empty() {
            return NameHash(node);
        }
        for label in name.to_lowercase().rsplit('.') {
            let mut buf = [0u8; 2 * NAME_HASH_SIZE];
            buf[..NAME_HASH_SIZE].copy_from_slice(&node);
            buf[NAME_HASH_SIZE..].copy_from_slice(&keccak256(label.as_bytes()));
            node = keccak256(&buf);
        }
        NameHash(node)
    }

    /// Registry key for `username` under the account namespace `suffix`
    pub fn for_username(username: &str, suffix: &str) -> Self {
        Self::of(&format!("{}.{}", username, suffix))
    }

    pub fn as_bytes(&self) -> &[u8; NAME_HASH_SIZE] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameHash({})", self.to_hex())
    }
}

impl FromStr for NameHash {
    type Err = NameHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; NAME_HASH_SIZE];
        hex::decode_to_slice(hex_str, &mut bytes).map_err(|_| NameHashError(s.to_string()))?;
        Ok(NameHash(bytes))
    }
}

impl Serialize for NameHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for NameHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
