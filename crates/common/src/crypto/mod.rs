//! Cryptographic primitives for FDP accounts
//!
//! - **Identity**: BIP-39 mnemonic -> BIP-32 secp256k1 key -> Ethereum-style
//!   address and public key. Derivation is pure, so every conforming client
//!   computes identical identities from the same mnemonic.
//! - **Namehash**: ENS namehash of `<username>.<suffix>`, the key of an
//!   account's record in the name registry.
//! - **Sealing**: ChaCha20-Poly1305 [`Secret`]s, including keys derived from
//!   the account password, used to keep the mnemonic out of the store in
//!   the clear.

mod identity;
mod namehash;
mod secret;

pub use identity::{
    keccak256, Address, IdentityError, Mnemonic, Wallet, DEFAULT_DERIVATION_PATH,
};
pub use namehash::{NameHash, NameHashError};
pub use secret::{Secret, SecretError, SALT_SIZE};
