//! The directory tree of an open pod.
//!
//! A pod's tree is a single directory manifest referenced from the root
//! manifest. Entries are stored in write order and sorted by name only
//! when listed, so the stored form does not depend on which client wrote
//! what first. Mutations rewrite the directory manifest and swap it into
//! the root manifest through the account's bounded commit.

pub mod path;

use bytes::Bytes;
use chrono::Utc;

use crate::error::FdpError;
use crate::linked_data::{Link, LD_RAW_CODEC};
use crate::manifest::{DirectoryEntry, DirectoryManifest, FileContent, NodeKind};
use crate::pod::Pod;
use crate::registry::NameRegistry;
use crate::store::ContentStore;
use crate::sync::RootHandle;

use path::ROOT;

/// Content type reported for directories
pub const DIRECTORY_CONTENT_TYPE: &str = "inode/directory";

/// A file or directory as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub content_type: String,
    pub creation_time: i64,
    pub modification_time: i64,
    pub access_time: i64,
    /// File size in bytes, 0 for directories
    pub size: u64,
    /// Link to the file bytes
    pub link: Option<Link>,
}

impl DirectoryNode {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// The implicit pod root. It has no stored entry, so its times are 0.
    fn root() -> Self {
        Self {
            name: ROOT.to_string(),
            path: ROOT.to_string(),
            kind: NodeKind::Directory,
            content_type: DIRECTORY_CONTENT_TYPE.to_string(),
            creation_time: 0,
            modification_time: 0,
            access_time: 0,
            size: 0,
            link: None,
        }
    }
}

impl From<&DirectoryEntry> for DirectoryNode {
    fn from(entry: &DirectoryEntry) -> Self {
        let (content_type, size, link) = match &entry.content {
            Some(content) => (content.content_type.clone(), content.size, Some(content.link)),
            None => (DIRECTORY_CONTENT_TYPE.to_string(), 0, None),
        };
        Self {
            name: entry.name().to_string(),
            path: entry.path.clone(),
            kind: entry.kind,
            content_type,
            creation_time: entry.creation_time,
            modification_time: entry.modification_time,
            access_time: entry.access_time,
            size,
            link,
        }
    }
}

/// Guess a content type from the file name
pub fn content_type_for(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// An open pod: directory operations scoped to one pod of one account.
#[derive(Debug, Clone)]
pub struct DirectoryTree<S, R> {
    handle: RootHandle<S, R>,
    pod: Pod,
}

impl<S: ContentStore, R: NameRegistry> DirectoryTree<S, R> {
    pub(crate) fn new(handle: RootHandle<S, R>, pod: Pod) -> Self {
        Self { handle, pod }
    }

    pub fn pod(&self) -> &Pod {
        &self.pod
    }

    /// Load the pod's current directory manifest
    pub async fn manifest(&self) -> Result<DirectoryManifest, FdpError> {
        let snapshot = self.handle.load().await?;
        let link = snapshot
            .root
            .directory(&self.pod.name)
            .ok_or_else(|| FdpError::PodNotFound(self.pod.name.clone()))?;
        let manifest: DirectoryManifest = self.handle.store().get_block(link).await?;
        manifest.validate(&self.pod.name)?;
        Ok(manifest)
    }

    /// Create a directory. Its parent must already exist.
    pub async fn create(&self, path: &str) -> Result<DirectoryNode, FdpError> {
        let path = path::normalize(path)?;
        if path == ROOT {
            return Err(FdpError::PathAlreadyExists(path));
        }

        let node = self
            .commit(|manifest, now| {
                check_free(manifest, &path)?;
                let entry = DirectoryEntry::directory(path.clone(), now);
                let node = DirectoryNode::from(&entry);
                manifest.insert(entry);
                Ok(node)
            })
            .await?;

        tracing::info!(pod = %self.pod.name, path = %node.path, "created directory");
        Ok(node)
    }

    /// Direct children of a directory, sorted by name
    pub async fn list(&self, path: &str) -> Result<Vec<DirectoryNode>, FdpError> {
        let path = path::normalize(path)?;
        let manifest = self.manifest().await?;
        if !manifest.is_dir(&path) {
            return Err(FdpError::NotFound(path));
        }

        let mut nodes: Vec<DirectoryNode> = manifest
            .children(&path)
            .map(DirectoryNode::from)
            .collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    pub async fn stat(&self, path: &str) -> Result<DirectoryNode, FdpError> {
        let path = path::normalize(path)?;
        if path == ROOT {
            return Ok(DirectoryNode::root());
        }
        let manifest = self.manifest().await?;
        manifest
            .get(&path)
            .map(DirectoryNode::from)
            .ok_or(FdpError::NotFound(path))
    }

    /// Store `data` and add it as a file at `path`
    pub async fn upload(&self, path: &str, data: Bytes) -> Result<DirectoryNode, FdpError> {
        let path = path::normalize(path)?;
        if path == ROOT {
            return Err(FdpError::PathAlreadyExists(path));
        }

        let size = data.len() as u64;
        let link = self.handle.store().put(LD_RAW_CODEC, data).await?;
        let content = FileContent {
            link,
            size,
            content_type: content_type_for(&path),
        };

        let node = self
            .commit(|manifest, now| {
                check_free(manifest, &path)?;
                let entry = DirectoryEntry::file(path.clone(), content.clone(), now);
                let node = DirectoryNode::from(&entry);
                manifest.insert(entry);
                Ok(node)
            })
            .await?;

        tracing::info!(
            pod = %self.pod.name,
            path = %node.path,
            size,
            content_type = %node.content_type,
            "uploaded file"
        );
        Ok(node)
    }

    pub async fn download(&self, path: &str) -> Result<Bytes, FdpError> {
        let path = path::normalize(path)?;
        let manifest = self.manifest().await?;
        let entry = manifest
            .get(&path)
            .ok_or_else(|| FdpError::NotFound(path.clone()))?;
        let content = entry
            .content
            .as_ref()
            .ok_or_else(|| FdpError::NotAFile(path.clone()))?;

        Ok(self.handle.store().get(&content.link).await?)
    }

    /// Remove a file or an empty directory
    pub async fn remove(&self, path: &str) -> Result<(), FdpError> {
        let path = path::normalize(path)?;
        if path == ROOT {
            return Err(FdpError::InvalidPath("cannot remove the pod root".to_string()));
        }

        self.commit(|manifest, _| {
            let entry = manifest
                .get(&path)
                .ok_or_else(|| FdpError::NotFound(path.clone()))?;
            if entry.is_dir() && manifest.children(&path).next().is_some() {
                return Err(FdpError::DirectoryNotEmpty(path.clone()));
            }
            manifest.remove(&path);
            Ok(())
        })
        .await?;

        tracing::info!(pod = %self.pod.name, path = %path, "removed node");
        Ok(())
    }

    /// Rewrite the pod's directory manifest inside one root commit.
    ///
    /// `mutate` runs against a freshly loaded manifest on every attempt
    /// and receives the current unix time.
    async fn commit<T, F>(&self, mutate: F) -> Result<T, FdpError>
    where
        F: Fn(&mut DirectoryManifest, i64) -> Result<T, FdpError>,
    {
        let pod = self.pod.name.as_str();
        let mutate = &mutate;

        self.handle
            .commit(|mut root| {
                let store = self.handle.store().clone();
                async move {
                    let link = *root
                        .directory(pod)
                        .ok_or_else(|| FdpError::PodNotFound(pod.to_string()))?;
                    let mut manifest: DirectoryManifest = store.get_block(&link).await?;
                    manifest.validate(pod)?;

                    let value = mutate(&mut manifest, Utc::now().timestamp())?;

                    let link = store.put_block(&manifest).await?;
                    root.set_directory(pod, link);
                    Ok((root, value))
                }
            })
            .await
    }
}

/// A new node needs an existing parent directory and a free path
fn check_free(manifest: &DirectoryManifest, path: &str) -> Result<(), FdpError> {
    let parent = path::parent(path).unwrap_or(ROOT);
    if !manifest.is_dir(parent) {
        return Err(FdpError::ParentNotFound(path.to_string()));
    }
    if manifest.get(path).is_some() {
        return Err(FdpError::PathAlreadyExists(path.to_string()));
    }
    Ok(())
}
