//! Directory trees
//!
//! Relative paths, entries, the filesystem walker, and the path-to-metadata
//! snapshot that comparison and the structure view work on.

pub mod entry;
pub mod hasher;
pub mod path;
pub mod render;
pub mod snapshot;
pub mod walker;
