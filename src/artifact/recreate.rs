//! Recreator: materializes a parsed artifact on disk.
//!
//! The document is fully validated before the first write. Everything the run
//! creates is journaled; on the first filesystem failure the journal is
//! replayed in reverse and the created files and directories are removed.
//! Paths that existed before the run are never deleted.

use crate::artifact::reader::ArtifactDocument;
use crate::error::{ApiError, WriteError};
use crate::tree::entry::{EntryKind, TreeEntry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace, warn};

/// Options for one recreation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecreateOptions {
    /// Write into a non-empty target, overwriting files in place.
    pub allow_existing: bool,
}

/// Summary of a successful recreation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecreateReport {
    pub target: PathBuf,
    /// Directories created by this run, including implied parents.
    pub directories_created: usize,
    pub files_written: usize,
}

#[derive(Debug)]
enum Created {
    Dir(PathBuf),
    File(PathBuf),
}

/// Paths created so far, in creation order.
#[derive(Debug, Default)]
struct Journal {
    created: Vec<Created>,
    files_written: usize,
}

impl Journal {
    fn directories_created(&self) -> usize {
        self.created
            .iter()
            .filter(|c| matches!(c, Created::Dir(_)))
            .count()
    }

    fn rollback(self) {
        let total = self.created.len();
        for created in self.created.into_iter().rev() {
            let (path, result) = match created {
                Created::File(path) => {
                    let result = fs::remove_file(&path);
                    (path, result)
                }
                Created::Dir(path) => {
                    let result = fs::remove_dir(&path);
                    (path, result)
                }
            };
            match result {
                Ok(()) => trace!(path = %path.display(), "Removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Rollback could not remove path")
                }
            }
        }
        info!(paths = total, "Rolled back partial recreation");
    }
}

/// Writes an [`ArtifactDocument`] into a target directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recreator {
    options: RecreateOptions,
}

impl Recreator {
    pub fn new(options: RecreateOptions) -> Self {
        Self { options }
    }

    /// Recreate `document` under `target`. On failure nothing created by this
    /// call is left behind.
    #[instrument(skip_all, fields(target = %target.display()))]
    pub fn recreate(
        &self,
        document: &ArtifactDocument,
        target: &Path,
    ) -> Result<RecreateReport, ApiError> {
        self.check_target(target)?;
        if document.is_empty() {
            debug!("Artifact has no entries, creating only the target");
        } else {
            debug!(
                files = document.files().count(),
                directories = document.directories().count(),
                "Recreating artifact"
            );
        }

        let mut journal = Journal::default();
        match write_all(document, target, &mut journal) {
            Ok(()) => {
                let report = RecreateReport {
                    target: target.to_path_buf(),
                    directories_created: journal.directories_created(),
                    files_written: journal.files_written,
                };
                info!(
                    directories = report.directories_created,
                    files = report.files_written,
                    "Recreation completed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "Recreation failed, rolling back");
                journal.rollback();
                Err(e.into())
            }
        }
    }

    fn check_target(&self, target: &Path) -> Result<(), ApiError> {
        let metadata = match fs::metadata(target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_dir() {
            return Err(WriteError::TargetNotDirectory(target.to_path_buf()).into());
        }
        let is_empty = fs::read_dir(target)?.next().is_none();
        if !is_empty && !self.options.allow_existing {
            return Err(WriteError::TargetNotEmpty(target.to_path_buf()).into());
        }
        Ok(())
    }
}

/// Read `artifact` and recreate it under `target`.
pub fn recreate_from_path(
    artifact: &Path,
    target: &Path,
    options: RecreateOptions,
) -> Result<RecreateReport, ApiError> {
    let document = ArtifactDocument::from_path(artifact)?;
    Recreator::new(options).recreate(&document, target)
}

fn write_all(
    document: &ArtifactDocument,
    target: &Path,
    journal: &mut Journal,
) -> Result<(), WriteError> {
    // Missing target ancestors, outermost first.
    let mut missing: Vec<&Path> = target
        .ancestors()
        .filter(|p| !p.as_os_str().is_empty())
        .take_while(|p| !p.exists())
        .collect();
    missing.reverse();
    for dir in missing {
        ensure_dir(dir, journal)?;
    }

    for entry in &document.entries {
        for ancestor in entry.path.ancestors() {
            ensure_dir(&ancestor.to_fs_path(target), journal)?;
        }
        let path = entry.path.to_fs_path(target);
        match entry.kind {
            EntryKind::Directory => ensure_dir(&path, journal)?,
            EntryKind::File => write_file(entry, &path, journal)?,
        }
    }
    Ok(())
}

fn ensure_dir(path: &Path, journal: &mut Journal) -> Result<(), WriteError> {
    match fs::create_dir(path) {
        Ok(()) => {
            trace!(path = %path.display(), "Created directory");
            journal.created.push(Created::Dir(path.to_path_buf()));
            Ok(())
        }
        Err(source) if source.kind() == io::ErrorKind::AlreadyExists => {
            match existing_type(path) {
                Some(file_type) if file_type.is_symlink() => {
                    Err(WriteError::SymlinkInTarget(path.to_path_buf()))
                }
                Some(file_type) if file_type.is_dir() => Ok(()),
                _ => Err(WriteError::CreateDir {
                    path: path.to_path_buf(),
                    source,
                }),
            }
        }
        Err(source) => Err(WriteError::CreateDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// File type of `path` itself, without following a final symbolic link.
fn existing_type(path: &Path) -> Option<fs::FileType> {
    fs::symlink_metadata(path).ok().map(|m| m.file_type())
}

fn write_file(entry: &TreeEntry, path: &Path, journal: &mut Journal) -> Result<(), WriteError> {
    let existing = existing_type(path);
    if existing.is_some_and(|file_type| file_type.is_symlink()) {
        return Err(WriteError::SymlinkInTarget(path.to_path_buf()));
    }
    if existing.is_some() {
        debug!(path = %path.display(), "Overwriting existing file");
    } else {
        journal.created.push(Created::File(path.to_path_buf()));
    }
    fs::write(path, &entry.content).map_err(|source| WriteError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    apply_mode(path, entry.mode)?;
    journal.files_written += 1;
    trace!(path = %entry.path, size = entry.size, "Wrote file");
    Ok(())
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<(), WriteError> {
    use std::os::unix::fs::PermissionsExt;
    let Some(mode) = mode else {
        return Ok(());
    };
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|source| {
        WriteError::SetPermissions {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<(), WriteError> {
    Ok(())
}
