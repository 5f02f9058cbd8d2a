//! Accounts: registration and login against the name registry.

use std::fmt;

use crate::config::Config;
use crate::crypto::{Address, Mnemonic, NameHash, Wallet};
use crate::error::FdpError;
use crate::linked_data::Link;
use crate::manifest::{Credentials, RootManifest};
use crate::registry::{NameRecord, NameRegistry, NameRegistryError};
use crate::store::ContentStore;
use crate::sync::RootHandle;

/// A logged-in account.
///
/// Holds the mnemonic, so `Debug` only shows the public half.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    username: String,
    name_hash: NameHash,
    address: Address,
    public_key: String,
    mnemonic: Mnemonic,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("name_hash", &self.name_hash)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn name_hash(&self) -> &NameHash {
        &self.name_hash
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Uncompressed public key, hex without `0x`
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }
}

/// Usernames become a DNS-like label under the name suffix
pub fn validate_username(username: &str) -> Result<(), FdpError> {
    if username.is_empty() {
        return Err(FdpError::InvalidUsername("username is empty".to_string()));
    }
    if username
        .chars()
        .any(|c| c == '.' || c == '/' || c.is_whitespace())
    {
        return Err(FdpError::InvalidUsername(format!(
            "{} contains '.', '/' or whitespace",
            username
        )));
    }
    Ok(())
}

/// Open the credentials sealed in a root manifest.
///
/// Any failure to open them is reported as `AuthenticationFailed`.
pub fn unlock(root: &RootManifest, password: &str) -> Result<Mnemonic, FdpError> {
    root.credentials().open(password).map_err(|err| {
        tracing::debug!(%err, "failed to open credentials");
        FdpError::AuthenticationFailed
    })
}

/// Derives identities and drives registration and login.
#[derive(Debug, Clone)]
pub struct IdentityManager<S, R> {
    store: S,
    registry: R,
    config: Config,
}

impl<S: ContentStore, R: NameRegistry> IdentityManager<S, R> {
    pub fn new(store: S, registry: R, config: Config) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Registry key for a username
    pub fn name_hash(&self, username: &str) -> NameHash {
        NameHash::for_username(username, &self.config.name_suffix)
    }

    /// Derive the wallet a mnemonic controls under the configured path
    pub fn wallet(&self, mnemonic: &Mnemonic) -> Result<Wallet, FdpError> {
        Ok(Wallet::from_mnemonic_with_path(
            mnemonic,
            &self.config.derivation_path,
        )?)
    }

    /// Handle on the account's root manifest
    pub fn root(&self, name_hash: NameHash) -> RootHandle<S, R> {
        RootHandle::new(
            self.store.clone(),
            self.registry.clone(),
            name_hash,
            self.config.max_commit_attempts,
        )
    }

    /// Register a new account under a freshly generated mnemonic
    pub async fn register(&self, username: &str, password: &str) -> Result<Account, FdpError> {
        self.register_with_mnemonic(username, password, Mnemonic::generate())
            .await
    }

    /// Register a new account controlled by an existing mnemonic
    pub async fn register_with_mnemonic(
        &self,
        username: &str,
        password: &str,
        mnemonic: Mnemonic,
    ) -> Result<Account, FdpError> {
        validate_username(username)?;
        let name_hash = self.name_hash(username);

        if self.registry.exists(&name_hash).await? {
            return Err(FdpError::DuplicateUsername(username.to_string()));
        }

        let wallet = self.wallet(&mnemonic)?;
        let genesis = RootManifest::new(Credentials::seal(&mnemonic, password)?);
        let pointer = self.store.put_block(&genesis).await?;

        let record = NameRecord {
            address: wallet.address(),
            public_key: wallet.public_key_hex(),
            root_manifest_pointer: pointer,
        };

        // exclusive create; a racing registration surfaces here
        match self.registry.register(name_hash, record).await {
            Ok(()) => {}
            Err(NameRegistryError::AlreadyExists(_)) => {
                return Err(FdpError::DuplicateUsername(username.to_string()))
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(
            username,
            %name_hash,
            address = %wallet.address(),
            "registered account"
        );

        Ok(Account {
            username: username.to_string(),
            name_hash,
            address: wallet.address(),
            public_key: wallet.public_key_hex(),
            mnemonic,
        })
    }

    /// Log in with a password, recovering the mnemonic from the sealed
    ///  credentials in the account's root manifest
    pub async fn login(&self, username: &str, password: &str) -> Result<Account, FdpError> {
        validate_username(username)?;
        let name_hash = self.name_hash(username);
        let record = self.resolve(username, &name_hash).await?;

        let root: RootManifest = self.store.get_block(&record.root_manifest_pointer).await?;
        root.validate()?;
        let mnemonic = unlock(&root, password)?;

        let account = self.verify(username, name_hash, &record, mnemonic)?;
        tracing::info!(username, address = %account.address, "logged in");
        Ok(account)
    }

    /// Log in by proving control of the mnemonic directly
    pub async fn login_with_mnemonic(
        &self,
        username: &str,
        mnemonic: Mnemonic,
    ) -> Result<Account, FdpError> {
        validate_username(username)?;
        let name_hash = self.name_hash(username);
        let record = self.resolve(username, &name_hash).await?;

        let account = self.verify(username, name_hash, &record, mnemonic)?;
        tracing::info!(username, address = %account.address, "logged in with mnemonic");
        Ok(account)
    }

    /// Current root manifest pointer for a username
    pub async fn pointer(&self, username: &str) -> Result<Link, FdpError> {
        let name_hash = self.name_hash(username);
        Ok(self
            .resolve(username, &name_hash)
            .await?
            .root_manifest_pointer)
    }

    async fn resolve(&self, username: &str, name_hash: &NameHash) -> Result<NameRecord, FdpError> {
        match self.registry.resolve(name_hash).await {
            Ok(record) => Ok(record),
            Err(NameRegistryError::NotFound(_)) => {
                Err(FdpError::NotFoundRegistryRecord(username.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn verify(
        &self,
        username: &str,
        name_hash: NameHash,
        record: &NameRecord,
        mnemonic: Mnemonic,
    ) -> Result<Account, FdpError> {
        let wallet = self.wallet(&mnemonic)?;
        if wallet.address() != record.address {
            tracing::debug!(
                username,
                registered = %record.address,
                derived = %wallet.address(),
                "derived address does not match registry"
            );
            return Err(FdpError::AuthenticationFailed);
        }

        Ok(Account {
            username: username.to_string(),
            name_hash,
            address: record.address,
            public_key: wallet.public_key_hex(),
            mnemonic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock() {
        let mnemonic = Mnemonic::generate();
        let root = RootManifest::new(Credentials::seal(&mnemonic, "secret").unwrap());

        assert_eq!(unlock(&root, "secret").unwrap(), mnemonic);
        assert!(matches!(
            unlock(&root, "guess"),
            Err(FdpError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("alice_01-x").is_ok());

        for bad in ["", "a.b", "a/b", "a b", "tab\t"] {
            assert!(
                matches!(validate_username(bad), Err(FdpError::InvalidUsername(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
