use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::crypto::{Mnemonic, Secret, SecretError};
use crate::linked_data::{BlockEncoded, Link};

use super::{ManifestError, MANIFEST_VERSION};

/// A pod as recorded in the root manifest.
///
/// Indices start at 1, follow creation order and are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pod {
    pub name: String,
    pub index: u64,
}

/// The account mnemonic sealed under a password derived key.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde_as(as = "serde_with::Bytes")]
    salt: Vec<u8>,
    #[serde_as(as = "serde_with::Bytes")]
    ciphertext: Vec<u8>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("salt", &hex::encode(&self.salt))
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

impl Credentials {
    /// Seal `mnemonic` under `password` with a fresh salt
    pub fn seal(mnemonic: &Mnemonic, password: &str) -> Result<Self, SecretError> {
        let salt = Secret::generate_salt();
        let ciphertext =
            Secret::from_password(password, &salt).encrypt(mnemonic.phrase().as_bytes())?;
        Ok(Self {
            salt: salt.to_vec(),
            ciphertext,
        })
    }

    /// Recover the mnemonic. Fails on a wrong password or a corrupted envelope.
    pub fn open(&self, password: &str) -> Result<Mnemonic, SecretError> {
        let plaintext = Secret::from_password(password, &self.salt).decrypt(&self.ciphertext)?;
        let phrase = String::from_utf8(plaintext)
            .map_err(|_| anyhow::anyhow!("sealed mnemonic is not utf-8"))?;
        let mnemonic = Mnemonic::parse(&phrase)
            .map_err(|e| anyhow::anyhow!("sealed mnemonic is invalid: {}", e))?;
        Ok(mnemonic)
    }
}

/// The root of an account's persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootManifest {
    /// Manifest format version
    version: u64,
    /// Number of committed mutations since registration
    height: u64,
    /// The root manifest this one replaced
    previous: Option<Link>,
    /// Sealed account mnemonic
    credentials: Credentials,
    /// Owned pods, in creation (= index) order
    pods: Vec<Pod>,
    /// Pods shared with this account. Always empty, sharing is not implemented.
    shared_pods: Vec<Pod>,
    /// Pod name -> link to its directory manifest
    directories: BTreeMap<String, Link>,
}

impl BlockEncoded for RootManifest {}

impl RootManifest {
    /// The genesis manifest written at registration
    pub fn new(credentials: Credentials) -> Self {
        Self {
            version: MANIFEST_VERSION,
            height: 0,
            previous: None,
            credentials,
            pods: Vec::new(),
            shared_pods: Vec::new(),
            directories: BTreeMap::new(),
        }
    }

    /// Reject manifests no conforming writer could have produced
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion(self.version));
        }

        let mut names = HashSet::new();
        let mut last_index = 0;
        for pod in &self.pods {
            if !names.insert(pod.name.as_str()) {
                return Err(ManifestError::Malformed(format!(
                    "duplicate pod name {}",
                    pod.name
                )));
            }
            if pod.index <= last_index {
                return Err(ManifestError::Malformed(format!(
                    "pod {} has index {} after index {}",
                    pod.name, pod.index, last_index
                )));
            }
            last_index = pod.index;
            if !self.directories.contains_key(&pod.name) {
                return Err(ManifestError::Malformed(format!(
                    "pod {} has no directory manifest",
                    pod.name
                )));
            }
        }

        if self.directories.len() != self.pods.len() {
            return Err(ManifestError::Malformed(
                "directory manifests for unknown pods".to_string(),
            ));
        }
        Ok(())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn previous(&self) -> Option<&Link> {
        self.previous.as_ref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    pub fn shared_pods(&self) -> &[Pod] {
        &self.shared_pods
    }

    pub fn get_pod(&self, name: &str) -> Option<&Pod> {
        self.pods.iter().find(|pod| pod.name == name)
    }

    /// Index the next created pod will receive
    pub fn next_pod_index(&self) -> u64 {
        self.pods.iter().map(|pod| pod.index).max().unwrap_or(0) + 1
    }

    /// Append a pod with the next index. The caller checks for duplicates.
    pub fn add_pod(&mut self, name: String, directory: Link) -> Pod {
        let pod = Pod {
            index: self.next_pod_index(),
            name,
        };
        self.directories.insert(pod.name.clone(), directory);
        self.pods.push(pod.clone());
        pod
    }

    /// Link to a pod's directory manifest
    pub fn directory(&self, pod: &str) -> Option<&Link> {
        self.directories.get(pod)
    }

    pub fn set_directory(&mut self, pod: &str, link: Link) {
        self.directories.insert(pod.to_string(), link);
    }

    /// Chain this manifest onto the one it replaces
    pub fn advance(&mut self, previous: Link) {
        self.previous = Some(previous);
        self.height += 1;
    }
}
