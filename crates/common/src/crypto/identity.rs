use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha512;
use sha3::{Digest, Keccak256};

/// Derivation path for the first Ethereum account of a seed
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";
/// Entropy for a 12 word mnemonic
pub const MNEMONIC_ENTROPY_SIZE: usize = 16;
/// Size of an account address in bytes
pub const ADDRESS_SIZE: usize = 20;

const HARDENED_OFFSET: u32 = 1 << 31;
const BIP32_SEED_KEY: &[u8] = b"Bitcoin seed";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid mnemonic: {0}")]
    Mnemonic(#[from] bip39::Error),
    #[error("invalid derivation path: {0}")]
    DerivationPath(String),
    #[error("key derivation produced an invalid key")]
    InvalidDerivedKey,
    #[error("invalid address: {0}")]
    Address(String),
}

/// Keccak-256 of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// BIP-39 recovery phrase. The only secret that can restore an account.
#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic(bip39::Mnemonic);

impl Mnemonic {
    /// Generate a fresh 12 word English mnemonic from OS entropy
    pub fn generate() -> Self {
        let mut entropy = [0u8; MNEMONIC_ENTROPY_SIZE];
        getrandom::getrandom(&mut entropy).expect("failed to generate random bytes");
        let mnemonic = bip39::Mnemonic::from_entropy(&entropy)
            .expect("16 bytes is a valid BIP-39 entropy length");
        Self(mnemonic)
    }

    /// Parse a phrase. Whitespace and unicode normalization are handled by bip39.
    pub fn parse(phrase: &str) -> Result<Self, IdentityError> {
        Ok(Self(bip39::Mnemonic::parse_normalized(phrase.trim())?))
    }

    pub fn phrase(&self) -> String {
        self.0.to_string()
    }

    pub fn word_count(&self) -> usize {
        self.0.word_count()
    }

    /// BIP-39 seed with an empty passphrase
    pub fn seed(&self) -> [u8; 64] {
        self.0.to_seed("")
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mnemonic(<{} words redacted>)", self.word_count())
    }
}

/// A 20 byte account address, displayed with the EIP-55 checksum.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Address of an uncompressed secp256k1 public key
    pub fn from_public_key(public: &PublicKey) -> Self {
        let uncompressed = public.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&hash[32 - ADDRESS_SIZE..]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// `0x`-prefixed, EIP-55 mixed-case hex
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(2 + lower.len());
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = IdentityError;

    /// Accepts any letter case; checksums are not enforced on input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; ADDRESS_SIZE];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|_| IdentityError::Address(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// secp256k1 keypair derived from a mnemonic along a BIP-32 path.
///
/// Derivation is a pure function of (mnemonic, path): every conforming
/// client must arrive at the same key, public key and address.
#[derive(Clone)]
pub struct Wallet {
    secret: SecretKey,
    public: PublicKey,
}

impl Wallet {
    pub fn from_mnemonic(mnemonic: &Mnemonic) -> Result<Self, IdentityError> {
        Self::from_mnemonic_with_path(mnemonic, DEFAULT_DERIVATION_PATH)
    }

    pub fn from_mnemonic_with_path(mnemonic: &Mnemonic, path: &str) -> Result<Self, IdentityError> {
        let path = parse_derivation_path(path)?;
        let secp = Secp256k1::new();

        let (mut key, mut chain_code) = master_key(&mnemonic.seed())?;
        for index in path {
            (key, chain_code) = derive_child(&secp, &key, &chain_code, index)?;
        }

        let public = PublicKey::from_secret_key(&secp, &key);
        Ok(Self {
            secret: key,
            public,
        })
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public)
    }

    /// Uncompressed SEC1 public key as plain hex (no `0x`)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public.serialize_uncompressed())
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Parse `m/44'/60'/0'/0/0` style paths; `'` or `h` marks hardened indices.
fn parse_derivation_path(path: &str) -> Result<Vec<u32>, IdentityError> {
    let invalid = || IdentityError::DerivationPath(path.to_string());
    let mut parts = path.split('/');
    if parts.next() != Some("m") {
        return Err(invalid());
    }

    parts
        .map(|part| {
            let (digits, hardened) = match part.strip_suffix('\'').or(part.strip_suffix('h')) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            let index: u32 = digits.parse().map_err(|_| invalid())?;
            if index >= HARDENED_OFFSET {
                return Err(invalid());
            }
            Ok(if hardened {
                index + HARDENED_OFFSET
            } else {
                index
            })
        })
        .collect()
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("hmac accepts keys of any length");
    mac.update(data);
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn split_key_material(i: &[u8; 64]) -> Result<(SecretKey, [u8; 32]), IdentityError> {
    let key = SecretKey::from_slice(&i[..32]).map_err(|_| IdentityError::InvalidDerivedKey)?;
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&i[32..]);
    Ok((key, chain_code))
}

fn master_key(seed: &[u8]) -> Result<(SecretKey, [u8; 32]), IdentityError> {
    split_key_material(&hmac_sha512(BIP32_SEED_KEY, seed))
}

// CKDpriv from BIP-32
fn derive_child(
    secp: &Secp256k1<secp256k1::All>,
    parent: &SecretKey,
    chain_code: &[u8; 32],
    index: u32,
) -> Result<(SecretKey, [u8; 32]), IdentityError> {
    let mut data = Vec::with_capacity(37);
    if index >= HARDENED_OFFSET {
        data.push(0);
        data.extend_from_slice(&parent.secret_bytes());
    } else {
        data.extend_from_slice(&PublicKey::from_secret_key(secp, parent).serialize());
    }
    data.extend_from_slice(&index.to_be_bytes());

    let i = hmac_sha512(chain_code, &data);
    let mut tweak_bytes = [0u8; 32];
    tweak_bytes.copy_from_slice(&i[..32]);
    let tweak = Scalar::from_be_bytes(tweak_bytes).map_err(|_| IdentityError::InvalidDerivedKey)?;
    let child = parent
        .add_tweak(&tweak)
        .map_err(|_| IdentityError::InvalidDerivedKey)?;

    let mut child_chain = [0u8; 32];
    child_chain.copy_from_slice(&i[32..]);
    Ok((child, child_chain))
}
