//! dirsnap: directory trees as single text artifacts
//!
//! Serializes a directory tree into one self-describing text file, recreates
//! a tree from such a file, and compares two trees given as directories or
//! artifacts.

pub mod artifact;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod tree;
