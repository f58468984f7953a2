//! Filesystem walker for traversing directory structures

use crate::error::{AccessError, ApiError, ArgumentError};
use crate::ignore::ExcludeRules;
use crate::tree::entry::TreeEntry;
use crate::tree::path::RelPath;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Filesystem walker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Whether to follow symbolic links (default: false, links are reported as skipped)
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Extra exclusion patterns on top of the built-in defaults
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Also exclude patterns listed in the root's .gitignore
    #[serde(default = "default_true")]
    pub use_gitignore: bool,
    /// Maximum depth to traverse (None = unlimited)
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Files larger than this many bytes are skipped (None = unlimited)
    #[serde(default)]
    pub max_file_size: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            exclude: Vec::new(),
            use_gitignore: true,
            max_depth: None,
            max_file_size: None,
        }
    }
}

/// Everything a full walk produced.
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    pub entries: Vec<TreeEntry>,
    pub skipped: Vec<AccessError>,
}

impl WalkOutcome {
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_file()).count()
    }

    pub fn directory_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_dir()).count()
    }
}

/// Deterministic walker over one root directory.
pub struct PathWalker {
    root: PathBuf,
    config: WalkConfig,
    rules: ExcludeRules,
}

impl PathWalker {
    /// Create a walker; exclusion rules come from the config.
    pub fn new(root: &Path, config: WalkConfig) -> Result<Self, ApiError> {
        let root = resolve_root(root)?;
        let rules =
            ExcludeRules::load(&root, config.exclude.as_slice(), config.use_gitignore)?;
        Ok(Self {
            root,
            config,
            rules,
        })
    }

    /// Create a walker with explicit exclusion rules.
    pub fn with_rules(
        root: &Path,
        config: WalkConfig,
        rules: ExcludeRules,
    ) -> Result<Self, ApiError> {
        let root = resolve_root(root)?;
        Ok(Self {
            root,
            config,
            rules,
        })
    }

    /// Additionally skip `path` (absolute or relative to the current directory)
    /// when it lies inside the root. Used for an artifact being written or
    /// compared against its own directory.
    pub fn exclude_fs_path(mut self, path: &Path) -> Self {
        let absolute = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => dunce::canonicalize(parent)
                .ok()
                .and_then(|p| path.file_name().map(|name| p.join(name))),
            _ => std::env::current_dir()
                .ok()
                .and_then(|cwd| dunce::canonicalize(cwd).ok())
                .map(|cwd| cwd.join(path)),
        };
        if let Some(absolute) = absolute {
            if let Ok(rel) = RelPath::from_fs_path(&self.root, &absolute) {
                debug!(path = %rel, "Excluding output path from walk");
                self.rules = self.rules.with_path(rel);
            }
        }
        self
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root directory name as recorded in artifact headers.
    pub fn root_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string())
    }

    pub fn rules(&self) -> &ExcludeRules {
        &self.rules
    }

    /// Lazy sequence of entries in deterministic order. Every call starts a
    /// fresh traversal.
    pub fn entries(&self) -> WalkIter<'_> {
        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .sort_by_file_name();
        WalkIter {
            walker: self,
            inner: walker.into_iter(),
        }
    }

    /// Walk the whole tree, collecting entries and skipped paths.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn walk(&self) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        for item in self.entries() {
            match item {
                Ok(entry) => outcome.entries.push(entry),
                Err(skipped) => {
                    warn!("{}", skipped);
                    outcome.skipped.push(skipped);
                }
            }
        }
        info!(
            entries = outcome.entries.len(),
            skipped = outcome.skipped.len(),
            "Walk completed"
        );
        outcome
    }

    fn read_file(&self, rel: RelPath, entry: &DirEntry) -> Result<TreeEntry, AccessError> {
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| AccessError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(limit) = self.config.max_file_size {
            if metadata.len() > limit {
                return Err(AccessError::TooLarge {
                    path: path.to_path_buf(),
                    size: metadata.len(),
                    limit,
                });
            }
        }
        let content = std::fs::read(path).map_err(|e| AccessError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        trace!(path = %rel, size = content.len(), "Read file");
        Ok(TreeEntry::file(rel, content, file_mode(&metadata)))
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf, ApiError> {
    if !root.exists() {
        return Err(ArgumentError::RootNotFound(root.to_path_buf()).into());
    }
    if !root.is_dir() {
        return Err(ArgumentError::RootNotDirectory(root.to_path_buf()).into());
    }
    Ok(dunce::canonicalize(root)?)
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_mode(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}

/// Iterator returned by [`PathWalker::entries`].
///
/// Each file is opened, read and closed inside `next`, so at most one file
/// handle is open at a time.
pub struct WalkIter<'a> {
    walker: &'a PathWalker,
    inner: walkdir::IntoIter,
}

impl Iterator for WalkIter<'_> {
    type Item = Result<TreeEntry, AccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.walker.root.clone());
                    return Some(Err(AccessError::Unreadable {
                        path,
                        reason: e.to_string(),
                    }));
                }
            };

            // The root itself is implied by the artifact header.
            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            let is_dir = file_type.is_dir();

            let rel = match RelPath::from_fs_path(&self.walker.root, entry.path()) {
                Ok(rel) => rel,
                Err(reason) => {
                    if is_dir {
                        self.inner.skip_current_dir();
                    }
                    let path = entry.path().to_path_buf();
                    return Some(Err(if entry.file_name().to_str().is_none() {
                        AccessError::NonUtf8Name { path }
                    } else {
                        AccessError::InvalidName { path, reason }
                    }));
                }
            };

            if self.walker.rules.is_excluded(&rel, is_dir) {
                trace!(path = %rel, "Excluded");
                if is_dir {
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if file_type.is_symlink() {
                return Some(Err(AccessError::Symlink {
                    path: entry.path().to_path_buf(),
                }));
            }

            if is_dir {
                return Some(Ok(TreeEntry::directory(rel)));
            }

            if file_type.is_file() {
                return Some(self.walker.read_file(rel, &entry));
            }

            return Some(Err(AccessError::Unsupported {
                path: entry.path().to_path_buf(),
            }));
        }
    }
}
