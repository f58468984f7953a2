//! In-memory tree snapshots used for comparison and structure views.
//!
//! A snapshot keeps kind, size and content hash per path, plus the text of
//! UTF-8 files for line diffs. Binary contents are dropped after hashing. It
//! is built either by walking a directory or from a parsed artifact, so every
//! comparison runs on the same representation.

use crate::artifact::format::is_text;
use crate::artifact::reader::ArtifactDocument;
use crate::error::{AccessError, ApiError, ArgumentError};
use crate::ignore::ExcludeRules;
use crate::tree::entry::{EntryKind, TreeEntry};
use crate::tree::hasher::{compute_content_hash, ContentHash};
use crate::tree::path::RelPath;
use crate::tree::walker::{PathWalker, WalkConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Metadata kept for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub kind: EntryKind,
    pub size: u64,
    pub hash: Option<ContentHash>,
    /// File content, when it is text.
    pub text: Option<String>,
}

impl SnapshotEntry {
    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            hash: None,
            text: None,
        }
    }

    pub fn file(content: &[u8]) -> Self {
        Self {
            kind: EntryKind::File,
            size: content.len() as u64,
            hash: Some(compute_content_hash(content)),
            text: text_of(content),
        }
    }
}

fn text_of(content: &[u8]) -> Option<String> {
    if is_text(content) {
        std::str::from_utf8(content).ok().map(str::to_owned)
    } else {
        None
    }
}

impl From<&TreeEntry> for SnapshotEntry {
    fn from(entry: &TreeEntry) -> Self {
        Self {
            kind: entry.kind,
            size: entry.size,
            hash: entry.hash,
            text: if entry.is_file() {
                text_of(&entry.content)
            } else {
                None
            },
        }
    }
}

/// Path-keyed view of a whole tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    root_name: String,
    entries: BTreeMap<RelPath, SnapshotEntry>,
    skipped: Vec<AccessError>,
}

impl TreeSnapshot {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            ..Self::default()
        }
    }

    /// Insert an entry; missing parent directories are added as well.
    pub fn insert(&mut self, path: RelPath, entry: SnapshotEntry) {
        for ancestor in path.ancestors() {
            self.entries
                .entry(ancestor)
                .or_insert_with(SnapshotEntry::directory);
        }
        self.entries.insert(path, entry);
    }

    /// Walk the walker's root. Binary contents are hashed and dropped per
    /// entry.
    #[instrument(skip_all, fields(root = %walker.root().display()))]
    pub fn from_walker(walker: &PathWalker) -> Self {
        let mut snapshot = Self::new(walker.root_name());
        for item in walker.entries() {
            match item {
                Ok(entry) => snapshot.insert(entry.path.clone(), SnapshotEntry::from(&entry)),
                Err(skipped) => {
                    warn!("{}", skipped);
                    snapshot.skipped.push(skipped);
                }
            }
        }
        debug!(entries = snapshot.len(), "Built snapshot from directory");
        snapshot
    }

    pub fn from_document(document: &ArtifactDocument) -> Self {
        let mut snapshot = Self::new(document.header.root_name.clone());
        for entry in &document.entries {
            snapshot.insert(entry.path.clone(), SnapshotEntry::from(entry));
        }
        debug!(entries = snapshot.len(), "Built snapshot from artifact");
        snapshot
    }

    /// Drop every path excluded by `rules`, checking ancestors too.
    pub fn filtered(mut self, rules: &ExcludeRules) -> Self {
        self.entries.retain(|path, entry| {
            !rules.is_excluded_with_ancestors(path, entry.kind == EntryKind::Directory)
        });
        self
    }

    /// Re-key every path in Unicode NFC form. When two paths collide, the
    /// one that sorts last wins.
    pub fn normalized(self) -> Self {
        let mut entries = BTreeMap::new();
        for (path, entry) in self.entries {
            let key = path.normalized();
            if entries.contains_key(&key) {
                warn!(
                    path = %path,
                    normalized = %key,
                    "Paths collide after Unicode normalization"
                );
            }
            entries.insert(key, entry);
        }
        Self { entries, ..self }
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn get(&self, path: &RelPath) -> Option<&SnapshotEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in depth-first path order.
    pub fn iter(&self) -> impl Iterator<Item = (&RelPath, &SnapshotEntry)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &RelPath> {
        self.entries.keys()
    }

    pub fn skipped(&self) -> &[AccessError] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One side of a comparison or structure view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Directory(PathBuf),
    Artifact(PathBuf),
}

impl Source {
    /// A directory is walked, a regular file is parsed as an artifact.
    pub fn resolve(path: &Path) -> Result<Self, ApiError> {
        if path.is_dir() {
            Ok(Source::Directory(path.to_path_buf()))
        } else if path.is_file() {
            Ok(Source::Artifact(path.to_path_buf()))
        } else {
            Err(ArgumentError::InvalidSource(path.to_path_buf()).into())
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Source::Directory(path) | Source::Artifact(path) => path,
        }
    }

    pub fn load_snapshot(&self, config: &WalkConfig) -> Result<TreeSnapshot, ApiError> {
        self.load_snapshot_excluding(config, None)
    }

    /// Like [`Source::load_snapshot`], but a directory walk also skips
    /// `exclude` when it lies inside the directory.
    pub fn load_snapshot_excluding(
        &self,
        config: &WalkConfig,
        exclude: Option<&Path>,
    ) -> Result<TreeSnapshot, ApiError> {
        match self {
            Source::Directory(path) => {
                let mut walker = PathWalker::new(path, config.clone())?;
                if let Some(exclude) = exclude {
                    walker = walker.exclude_fs_path(exclude);
                }
                Ok(TreeSnapshot::from_walker(&walker))
            }
            Source::Artifact(path) => {
                let document = ArtifactDocument::from_path(path)?;
                Ok(TreeSnapshot::from_document(&document))
            }
        }
    }
}
