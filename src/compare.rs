//! Tree comparison
//!
//! Both sides are reduced to [`TreeSnapshot`]s first, so directories and
//! artifacts compare the same way. Directories compare by presence only;
//! files by kind, then size, then content hash. Changed text files also get
//! line counts and, on request, unified diff hunks.

use crate::error::ApiError;
use crate::ignore::ExcludeRules;
use crate::tree::entry::EntryKind;
use crate::tree::hasher::{short_hex, ContentHash};
use crate::tree::path::RelPath;
use crate::tree::snapshot::{SnapshotEntry, Source, TreeSnapshot};
use crate::tree::walker::WalkConfig;
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::{info, instrument};

/// Line-level view of a changed text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiff {
    pub lines_added: usize,
    pub lines_removed: usize,
    /// Unified diff hunks, each starting with its `@@` header line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified: Option<String>,
}

impl LineDiff {
    /// Diff `left` against `right` line by line. Hunks are rendered only
    /// when `context_lines` is given.
    pub fn between(left: &str, right: &str, context_lines: Option<usize>) -> Self {
        let diff = TextDiff::from_lines(left, right);
        let mut lines_added = 0;
        let mut lines_removed = 0;
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => lines_added += 1,
                ChangeTag::Delete => lines_removed += 1,
                ChangeTag::Equal => {}
            }
        }

        let unified = context_lines.map(|radius| {
            let mut out = String::new();
            for hunk in diff.unified_diff().context_radius(radius).iter_hunks() {
                out.push_str(&format!("{}\n", hunk.header()));
                for change in hunk.iter_changes() {
                    let sign = match change.tag() {
                        ChangeTag::Delete => '-',
                        ChangeTag::Insert => '+',
                        ChangeTag::Equal => ' ',
                    };
                    let line = change.value();
                    out.push(sign);
                    out.push_str(line);
                    if !line.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
            out
        });

        Self {
            lines_added,
            lines_removed,
            unified,
        }
    }
}

/// How a path present on both sides differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Modification {
    /// Both files, sizes differ.
    SizeChanged {
        left: u64,
        right: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<LineDiff>,
    },
    /// Both files, same size, different content.
    ContentChanged {
        size: u64,
        #[serde(with = "hex_hash")]
        left_hash: ContentHash,
        #[serde(with = "hex_hash")]
        right_hash: ContentHash,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<LineDiff>,
    },
    /// File on one side, directory on the other.
    KindChanged { left: EntryKind, right: EntryKind },
}

impl Modification {
    /// Line diff, when both sides are text files.
    pub fn line_diff(&self) -> Option<&LineDiff> {
        match self {
            Modification::SizeChanged { text, .. } | Modification::ContentChanged { text, .. } => {
                text.as_ref()
            }
            Modification::KindChanged { .. } => None,
        }
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modification::SizeChanged { left, right, .. } => {
                write!(f, "size {} -> {} bytes", left, right)?
            }
            Modification::ContentChanged {
                left_hash,
                right_hash,
                ..
            } => write!(
                f,
                "content {} -> {}",
                short_hex(left_hash),
                short_hex(right_hash)
            )?,
            Modification::KindChanged { left, right } => {
                return write!(f, "{} -> {}", kind_name(*left), kind_name(*right));
            }
        }
        match self.line_diff() {
            Some(text) => write!(f, ", +{} -{} lines", text.lines_added, text.lines_removed),
            None => Ok(()),
        }
    }
}

fn kind_name(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::File => "file",
        EntryKind::Directory => "directory",
    }
}

mod hex_hash {
    use crate::tree::hasher::ContentHash;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &ContentHash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ContentHash, D::Error> {
        let value = String::deserialize(deserializer)?;
        let bytes = hex::decode(&value).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("hash must be 32 bytes"))
    }
}

/// Differences from a left tree to a right tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Present only on the right.
    pub added: BTreeSet<RelPath>,
    /// Present only on the left.
    pub removed: BTreeSet<RelPath>,
    pub modified: BTreeMap<RelPath, Modification>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Comparison options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Compare path keys in Unicode NFC form.
    #[serde(default = "default_normalize")]
    pub normalize_unicode: bool,
    /// Render unified diff hunks for changed text files.
    #[serde(default)]
    pub unified_diff: bool,
    /// Unchanged lines shown around each hunk.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

fn default_normalize() -> bool {
    true
}

fn default_context_lines() -> usize {
    3
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            unified_diff: false,
            context_lines: default_context_lines(),
        }
    }
}

/// Diffs two snapshots. Stateless apart from its options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator {
    options: CompareOptions,
}

impl Comparator {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    pub fn compare(&self, left: &TreeSnapshot, right: &TreeSnapshot) -> DiffResult {
        if self.options.normalize_unicode {
            diff(
                &left.clone().normalized(),
                &right.clone().normalized(),
                &self.options,
            )
        } else {
            diff(left, right, &self.options)
        }
    }
}

fn line_diff(
    left: &SnapshotEntry,
    right: &SnapshotEntry,
    options: &CompareOptions,
) -> Option<LineDiff> {
    let (Some(left), Some(right)) = (&left.text, &right.text) else {
        return None;
    };
    let context_lines = options.unified_diff.then_some(options.context_lines);
    Some(LineDiff::between(left, right, context_lines))
}

fn diff(left: &TreeSnapshot, right: &TreeSnapshot, options: &CompareOptions) -> DiffResult {
    let mut result = DiffResult::default();

    for (path, l) in left.iter() {
        let Some(r) = right.get(path) else {
            result.removed.insert(path.clone());
            continue;
        };
        let modification = if l.kind != r.kind {
            Some(Modification::KindChanged {
                left: l.kind,
                right: r.kind,
            })
        } else if l.kind == EntryKind::Directory {
            None
        } else if l.size != r.size {
            Some(Modification::SizeChanged {
                left: l.size,
                right: r.size,
                text: line_diff(l, r, options),
            })
        } else {
            match (l.hash, r.hash) {
                (Some(left_hash), Some(right_hash)) if left_hash != right_hash => {
                    Some(Modification::ContentChanged {
                        size: l.size,
                        left_hash,
                        right_hash,
                        text: line_diff(l, r, options),
                    })
                }
                _ => None,
            }
        };
        if let Some(modification) = modification {
            result.modified.insert(path.clone(), modification);
        }
    }

    for path in right.paths() {
        if !left.contains(path) {
            result.added.insert(path.clone());
        }
    }

    result
}

/// Result of comparing two sources, with what each side skipped.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub left: String,
    pub right: String,
    pub diff: DiffResult,
    pub skipped: Vec<crate::error::AccessError>,
}

impl ComparisonReport {
    pub fn is_identical(&self) -> bool {
        self.diff.is_empty()
    }
}

/// Compare two paths, each a directory or an artifact file. `rules` are
/// applied to both sides, so an artifact compared against a filtered walk
/// sees the same exclusions. An artifact stored inside the directory on the
/// other side is left out of that walk.
#[instrument(skip(walk, rules, options), fields(left = %left.display(), right = %right.display()))]
pub fn compare_sources(
    left: &Path,
    right: &Path,
    walk: &WalkConfig,
    rules: &ExcludeRules,
    options: CompareOptions,
) -> Result<ComparisonReport, ApiError> {
    let left_source = Source::resolve(left)?;
    let right_source = Source::resolve(right)?;

    let left_snapshot = left_source
        .load_snapshot_excluding(walk, artifact_path(&right_source))?
        .filtered(rules);
    let right_snapshot = right_source
        .load_snapshot_excluding(walk, artifact_path(&left_source))?
        .filtered(rules);

    let diff = Comparator::new(options).compare(&left_snapshot, &right_snapshot);
    info!(
        added = diff.added.len(),
        removed = diff.removed.len(),
        modified = diff.modified.len(),
        "Comparison completed"
    );

    let skipped = left_snapshot
        .skipped()
        .iter()
        .chain(right_snapshot.skipped())
        .cloned()
        .collect();
    Ok(ComparisonReport {
        left: left.display().to_string(),
        right: right.display().to_string(),
        diff,
        skipped,
    })
}

fn artifact_path(source: &Source) -> Option<&Path> {
    match source {
        Source::Artifact(path) => Some(path),
        Source::Directory(_) => None,
    }
}
