//! Tree entries produced by a walk or decoded from an artifact

use crate::tree::hasher::{self, ContentHash};
use crate::tree::path::RelPath;
use serde::{Deserialize, Serialize};

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Artifact type marker.
    pub fn marker(self) -> char {
        match self {
            EntryKind::File => 'F',
            EntryKind::Directory => 'D',
        }
    }
}

/// One captured path: metadata plus, for files, the full content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: RelPath,
    pub kind: EntryKind,
    pub size: u64,
    /// File bytes; empty for directories.
    pub content: Vec<u8>,
    /// Content hash for files, `None` for directories.
    pub hash: Option<ContentHash>,
    /// Permission bits, when the platform reports them.
    pub mode: Option<u32>,
}

impl TreeEntry {
    /// Create a file entry, hashing its content.
    pub fn file(path: RelPath, content: Vec<u8>, mode: Option<u32>) -> Self {
        let hash = hasher::compute_content_hash(&content);
        Self {
            path,
            kind: EntryKind::File,
            size: content.len() as u64,
            content,
            hash: Some(hash),
            mode,
        }
    }

    /// Create a directory entry.
    pub fn directory(path: RelPath) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
            size: 0,
            content: Vec::new(),
            hash: None,
            mode: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
