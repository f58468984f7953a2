//! CLI parse: clap types for dirsnap. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// dirsnap - snapshot a directory tree into one text file, recreate it, compare trees
#[derive(Parser, Debug)]
#[command(name = "dirsnap", version)]
#[command(about = "Serialize directory trees into a single text artifact, recreate and compare them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (replaces global and dirsnap.toml loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Walk options shared by commands that read directories.
#[derive(Args, Debug, Clone, Default)]
pub struct WalkArgs {
    /// Extra exclusion pattern (name, glob, or root-relative path); repeatable
    #[arg(long = "exclude", short = 'e', value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Do not read exclusion patterns from the root's .gitignore
    #[arg(long)]
    pub no_gitignore: bool,

    /// Follow symbolic links instead of skipping them
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_size: Option<u64>,

    /// Do not descend deeper than this many levels
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serialize a directory tree into an artifact
    Generate {
        /// Directory to capture
        root: PathBuf,
        /// Artifact path (default: <root-name>_snapshot_<timestamp>.txt)
        output: Option<PathBuf>,
        /// Fail without writing the artifact if any path cannot be captured
        #[arg(long)]
        strict: bool,
        /// Store every file as base64
        #[arg(long)]
        base64: bool,
        #[command(flatten)]
        walk: WalkArgs,
    },
    /// Recreate a directory tree from an artifact
    Recreate {
        /// Artifact to read
        artifact: PathBuf,
        /// Directory to create
        target: PathBuf,
        /// Write into a non-empty target, overwriting files
        #[arg(long)]
        force: bool,
    },
    /// Compare two trees (directories or artifacts)
    Compare {
        /// Left side: directory or artifact
        left: PathBuf,
        /// Right side: directory or artifact
        right: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Compare paths byte for byte, without Unicode normalization
        #[arg(long)]
        no_normalize: bool,
        /// Show unified diff hunks for changed text files
        #[arg(long)]
        diff: bool,
        /// Unchanged lines around each hunk (implies --diff)
        #[arg(long, value_name = "LINES")]
        context: Option<usize>,
        #[command(flatten)]
        walk: WalkArgs,
    },
    /// Print the directory structure of a directory or artifact
    Tree {
        /// Directory or artifact
        source: PathBuf,
        #[command(flatten)]
        walk: WalkArgs,
    },
    /// Print the effective configuration
    Config {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
}
