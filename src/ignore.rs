//! Exclusion rules for walks and comparisons.
//!
//! Three sources are combined: built-in defaults (version-control metadata and
//! `__pycache__`), patterns from configuration or the command line, and,
//! when enabled, the patterns of the root's `.gitignore`.
//!
//! A pattern without `/` matches an entry name at any depth (`*.log`,
//! `node_modules`). A pattern containing `/` is anchored at the root and
//! matched against the whole relative path (`docs/generated`, `/build`).
//! A trailing `/` restricts the pattern to directories.

use crate::error::ArgumentError;
use crate::tree::path::RelPath;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Built-in exclusions, always active.
pub const BUILTIN_DEFAULTS: &[&str] = &[".git", ".hg", ".svn", ".jj", "__pycache__"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A single compiled exclusion pattern.
#[derive(Debug, Clone)]
pub struct ExcludePattern {
    raw: String,
    matcher: Pattern,
    anchored: bool,
    dir_only: bool,
}

impl ExcludePattern {
    pub fn parse(raw: &str) -> Result<Self, ArgumentError> {
        let trimmed = raw.trim();
        let invalid = |reason: &str| ArgumentError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };
        if trimmed.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        let dir_only = trimmed.ends_with('/');
        let body = trimmed.trim_end_matches('/');
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return Err(invalid("pattern matches the root itself"));
        }
        let matcher = Pattern::new(body).map_err(|e| invalid(e.msg))?;
        Ok(Self {
            raw: trimmed.to_string(),
            matcher,
            anchored,
            dir_only,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match one path (not its ancestors).
    pub fn matches(&self, path: &RelPath, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.anchored {
            self.matcher
                .matches_with(&path.to_string(), MATCH_OPTIONS)
        } else {
            self.matcher.matches_with(path.name(), MATCH_OPTIONS)
        }
    }
}

/// Read root .gitignore into a list of pattern strings (minimal parse: trim,
/// skip empty lines, comments and negations).
pub fn read_gitignore_patterns(root: &Path) -> Vec<String> {
    let gitignore_path = root.join(".gitignore");
    if !gitignore_path.is_file() {
        return Vec::new();
    }
    let Ok(contents) = fs::read_to_string(&gitignore_path) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('!') {
            debug!(pattern = line, "Negated .gitignore pattern not supported, skipping");
            continue;
        }
        out.push(line.to_string());
    }
    out
}

/// Compiled exclusion rule set.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    patterns: Vec<ExcludePattern>,
    exact: Vec<RelPath>,
}

impl ExcludeRules {
    /// Built-in defaults plus `extra` patterns.
    pub fn new<S: AsRef<str>>(extra: &[S]) -> Result<Self, ArgumentError> {
        let mut patterns = Vec::with_capacity(BUILTIN_DEFAULTS.len() + extra.len());
        for raw in BUILTIN_DEFAULTS {
            patterns.push(ExcludePattern::parse(raw)?);
        }
        for raw in extra {
            patterns.push(ExcludePattern::parse(raw.as_ref())?);
        }
        Ok(Self {
            patterns,
            exact: Vec::new(),
        })
    }

    /// Rules for walking `root`: defaults, `extra`, and the root `.gitignore`
    /// when `use_gitignore` is set. Unparsable `.gitignore` lines are skipped.
    pub fn load<S: AsRef<str>>(
        root: &Path,
        extra: &[S],
        use_gitignore: bool,
    ) -> Result<Self, ArgumentError> {
        let mut rules = Self::new(extra)?;
        if use_gitignore {
            for raw in read_gitignore_patterns(root) {
                match ExcludePattern::parse(&raw) {
                    Ok(pattern) => rules.patterns.push(pattern),
                    Err(e) => debug!(error = %e, "Ignoring unusable .gitignore pattern"),
                }
            }
        }
        Ok(rules)
    }

    /// Also exclude one exact path.
    pub fn with_path(mut self, path: RelPath) -> Self {
        self.exact.push(path);
        self
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(ExcludePattern::as_str)
    }

    /// Whether `path` itself matches a rule.
    pub fn is_excluded(&self, path: &RelPath, is_dir: bool) -> bool {
        if self.exact.iter().any(|p| p == path) {
            return true;
        }
        self.patterns.iter().any(|p| p.matches(path, is_dir))
    }

    /// Whether `path` or any of its ancestors matches a rule. Used where no
    /// pruning walk happened, e.g. entries decoded from an artifact.
    pub fn is_excluded_with_ancestors(&self, path: &RelPath, is_dir: bool) -> bool {
        path.ancestors()
            .iter()
            .any(|ancestor| self.is_excluded(ancestor, true))
            || self.is_excluded(path, is_dir)
    }
}
