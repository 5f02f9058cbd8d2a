use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::directory::path;
use crate::linked_data::{BlockEncoded, Link};

use super::{ManifestError, MANIFEST_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// Where a file's bytes live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileContent {
    /// Raw-codec link to the file bytes
    pub link: Link,
    pub size: u64,
    pub content_type: String,
}

/// One file or directory inside a pod.
///
/// Times are unix seconds. `content` is set for files and absent for
/// directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryEntry {
    /// Absolute normalized path, e.g. `/photos/2024`
    pub path: String,
    pub kind: NodeKind,
    pub creation_time: i64,
    pub modification_time: i64,
    pub access_time: i64,
    pub content: Option<FileContent>,
}

impl DirectoryEntry {
    pub fn directory(path: String, now: i64) -> Self {
        Self {
            path,
            kind: NodeKind::Directory,
            creation_time: now,
            modification_time: now,
            access_time: now,
            content: None,
        }
    }

    pub fn file(path: String, content: FileContent, now: i64) -> Self {
        Self {
            path,
            kind: NodeKind::File,
            creation_time: now,
            modification_time: now,
            access_time: now,
            content: Some(content),
        }
    }

    /// Final path segment
    pub fn name(&self) -> &str {
        path::name(&self.path)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Every node of a single pod, keyed by absolute path.
///
/// The pod root `/` is implicit and never stored as an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryManifest {
    version: u64,
    pod: String,
    entries: Vec<DirectoryEntry>,
}

impl BlockEncoded for DirectoryManifest {}

impl DirectoryManifest {
    /// An empty tree for a freshly created pod
    pub fn new(pod: &str) -> Self {
        Self {
            version: MANIFEST_VERSION,
            pod: pod.to_string(),
            entries: Vec::new(),
        }
    }

    /// Check the manifest is well formed and belongs to `pod`
    pub fn validate(&self, pod: &str) -> Result<(), ManifestError> {
        if self.version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion(self.version));
        }
        if self.pod != pod {
            return Err(ManifestError::Malformed(format!(
                "directory manifest belongs to pod {}, expected {}",
                self.pod, pod
            )));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            let normalized = path::normalize(&entry.path).ok();
            if entry.path == path::ROOT
                || normalized.as_deref() != Some(entry.path.as_str())
                || !seen.insert(entry.path.as_str())
            {
                return Err(ManifestError::Malformed(format!(
                    "invalid or duplicate path {}",
                    entry.path
                )));
            }
            if entry.is_dir() == entry.content.is_some() {
                return Err(ManifestError::Malformed(format!(
                    "{} has content inconsistent with its kind",
                    entry.path
                )));
            }
        }

        // every node hangs off the root or a stored directory
        let directories: HashSet<&str> = self
            .entries
            .iter()
            .filter(|entry| entry.is_dir())
            .map(|entry| entry.path.as_str())
            .collect();
        for entry in &self.entries {
            match path::parent(&entry.path) {
                Some(parent) if parent == path::ROOT || directories.contains(parent) => {}
                _ => {
                    return Err(ManifestError::Malformed(format!(
                        "{} has no parent directory",
                        entry.path
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn pod(&self) -> &str {
        &self.pod
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    /// Whether `path` names a directory. The root always does.
    pub fn is_dir(&self, path: &str) -> bool {
        path == path::ROOT || self.get(path).map(|e| e.is_dir()).unwrap_or(false)
    }

    /// Direct children of `dir`, in storage order
    pub fn children<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a DirectoryEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| path::parent(&entry.path) == Some(dir))
    }

    /// Add an entry. The caller checks the path is free and the parent exists.
    pub fn insert(&mut self, entry: DirectoryEntry) {
        self.entries.push(entry);
    }

    pub fn remove(&mut self, path: &str) -> Option<DirectoryEntry> {
        let position = self.entries.iter().position(|entry| entry.path == path)?;
        Some(self.entries.remove(position))
    }
}
