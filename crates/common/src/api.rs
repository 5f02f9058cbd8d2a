//! JSON shapes the core's data takes when served over HTTP.
//!
//! No server lives here. These are the bodies a serving layer returns, so
//! that clients written against another implementation of the protocol
//! read the same fields.

use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::directory::DirectoryNode;
use crate::pod::PodList;

pub const LOGGED_IN_MESSAGE: &str = "user logged-in successfully";
pub const SIGNED_UP_MESSAGE: &str = "user signed-up successfully";
pub const POD_CREATED_MESSAGE: &str = "pod created successfully";

/// Body of the login and registration responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub address: String,
    pub name_hash: String,
    pub public_key: String,
    pub message: String,
}

impl UserResponse {
    pub fn logged_in(account: &Account) -> Self {
        Self::new(account, LOGGED_IN_MESSAGE)
    }

    pub fn signed_up(account: &Account) -> Self {
        Self::new(account, SIGNED_UP_MESSAGE)
    }

    fn new(account: &Account, message: &str) -> Self {
        Self {
            address: account.address().to_string(),
            name_hash: account.name_hash().to_string(),
            public_key: account.public_key().to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn pod_created() -> Self {
        Self {
            message: POD_CREATED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodListResponse {
    pub pod_name: Vec<String>,
    pub shared_pod_name: Vec<String>,
}

impl From<&PodList> for PodListResponse {
    fn from(list: &PodList) -> Self {
        Self {
            pod_name: list.pods.iter().map(|pod| pod.name.clone()).collect(),
            shared_pod_name: list.shared_pods.iter().map(|pod| pod.name.clone()).collect(),
        }
    }
}

/// A directory listing entry. Times are unix seconds rendered as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryResponse {
    pub name: String,
    pub content_type: String,
    pub creation_time: String,
    pub modification_time: String,
    pub access_time: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<String>,
}

impl From<&DirectoryNode> for EntryResponse {
    fn from(node: &DirectoryNode) -> Self {
        Self {
            name: node.name.clone(),
            content_type: node.content_type.clone(),
            creation_time: node.creation_time.to_string(),
            modification_time: node.modification_time.to_string(),
            access_time: node.access_time.to_string(),
            size: (!node.is_dir()).then(|| node.size.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirListResponse {
    pub dirs: Vec<EntryResponse>,
    #[serde(default)]
    pub files: Vec<EntryResponse>,
}

impl From<&[DirectoryNode]> for DirListResponse {
    /// Splits a listing into directories and files, keeping its order
    fn from(nodes: &[DirectoryNode]) -> Self {
        let (dirs, files): (Vec<_>, Vec<_>) = nodes.iter().partition(|node| node.is_dir());
        Self {
            dirs: dirs.into_iter().map(EntryResponse::from).collect(),
            files: files.into_iter().map(EntryResponse::from).collect(),
        }
    }
}
