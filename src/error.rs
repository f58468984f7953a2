//! Error types for dirsnap.
//!
//! Component errors are kept separate so callers can tell recoverable walk
//! problems (`AccessError`) from fatal artifact and filesystem failures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A source path that could not be captured during a walk.
///
/// Recoverable: the walker records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessError {
    #[error("Cannot read {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Skipped symbolic link {path:?}")]
    Symlink { path: PathBuf },

    #[error("Skipped {path:?}: file name is not valid UTF-8")]
    NonUtf8Name { path: PathBuf },

    #[error("Skipped {path:?}: {reason}")]
    InvalidName { path: PathBuf, reason: String },

    #[error("Skipped {path:?}: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Skipped {path:?}: not a regular file or directory")]
    Unsupported { path: PathBuf },
}

impl AccessError {
    /// Path the error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            AccessError::Unreadable { path, .. }
            | AccessError::Symlink { path }
            | AccessError::NonUtf8Name { path }
            | AccessError::InvalidName { path, .. }
            | AccessError::TooLarge { path, .. }
            | AccessError::Unsupported { path } => path,
        }
    }
}

/// Corrupt or unparsable artifact. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Artifact is empty: missing header line")]
    MissingHeader,

    #[error("Line {line}: invalid header: {reason}")]
    InvalidHeader { line: usize, reason: String },

    #[error("Line {line}: unsupported artifact version {version}")]
    UnsupportedVersion { line: usize, version: String },

    #[error("Line {line}: invalid entry line: {reason}")]
    InvalidEntry { line: usize, reason: String },

    #[error("Line {line}: invalid path {path:?}: {reason}")]
    InvalidPath {
        line: usize,
        path: String,
        reason: String,
    },

    #[error("Line {line}: payload truncated: expected {expected} bytes, found {found}")]
    Truncated {
        line: usize,
        expected: u64,
        found: u64,
    },

    #[error("Line {line}: missing end delimiter after payload of {path}")]
    MissingDelimiter { line: usize, path: String },

    #[error("Line {line}: TEXT payload of {path} is not valid UTF-8")]
    InvalidText { line: usize, path: String },

    #[error("Line {line}: BASE64 payload of {path} does not decode: {reason}")]
    InvalidBase64 {
        line: usize,
        path: String,
        reason: String,
    },

    #[error("Line {line}: duplicate path {path}")]
    DuplicatePath { line: usize, path: String },

    #[error("Line {line}: {path} conflicts with file {file}")]
    PathConflict {
        line: usize,
        path: String,
        file: String,
    },
}

/// Target filesystem failure during recreation.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Target {0:?} exists and is not empty (use --force to write into it)")]
    TargetNotEmpty(PathBuf),

    #[error("Target {0:?} exists and is not a directory")]
    TargetNotDirectory(PathBuf),

    #[error("Refusing to write through symbolic link {0:?} inside the target")]
    SymlinkInTarget(PathBuf),

    #[error("Failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path:?}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to set permissions on {path:?}: {source}")]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid usage detected before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("Root {0:?} does not exist")]
    RootNotFound(PathBuf),

    #[error("Root {0:?} is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("Source {0:?} is neither a directory nor an artifact file")]
    InvalidSource(PathBuf),

    #[error("Invalid exclude pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid value for {option}: {reason}")]
    InvalidOption { option: String, reason: String },
}

/// Top-level error surfaced by operations and the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Malformed artifact: {0}")]
    Format(#[from] FormatError),

    #[error("Recreation failed: {0}")]
    Write(#[from] WriteError),

    #[error("Invalid arguments: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Strict mode: {0} path(s) could not be captured")]
    StrictModeViolation(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
