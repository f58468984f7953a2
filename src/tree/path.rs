//! Relative path representation, validation and escaping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// A path relative to a tree root, stored as an ordered list of segments.
///
/// Ordering compares segment by segment, which matches a depth-first walk with
/// siblings sorted by name (`a`, `a/x`, `a-b`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RelPath {
    segments: Vec<String>,
}

impl RelPath {
    /// Build a path from segments, validating each one.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err("path is empty".to_string());
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Parse a `/`-separated relative path.
    pub fn parse(value: &str) -> Result<Self, String> {
        if value.starts_with('/') {
            return Err("path must be relative".to_string());
        }
        Self::from_segments(value.split('/'))
    }

    /// Express `path` relative to `root`. Fails for paths outside the root or
    /// with non-UTF-8 components.
    pub fn from_fs_path(root: &Path, path: &Path) -> Result<Self, String> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| format!("{} is outside {}", path.display(), root.display()))?;
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    let name = name
                        .to_str()
                        .ok_or_else(|| "file name is not valid UTF-8".to_string())?;
                    segments.push(name.to_string());
                }
                Component::CurDir => {}
                _ => return Err(format!("unexpected component in {}", relative.display())),
            }
        }
        Self::from_segments(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment.
    pub fn name(&self) -> &str {
        // Non-empty by construction.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Parent path, `None` for top-level entries.
    pub fn parent(&self) -> Option<RelPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// All proper ancestors, shallowest first.
    pub fn ancestors(&self) -> Vec<RelPath> {
        (1..self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }

    /// Whether `self` is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &RelPath) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// Join onto a filesystem root.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }

    /// Unicode NFC form of every segment.
    pub fn normalized(&self) -> RelPath {
        Self {
            segments: self.segments.iter().map(|s| s.nfc().collect()).collect(),
        }
    }

    /// Artifact form: `/`-joined, with `%`, LF and CR escaped.
    pub fn escaped(&self) -> String {
        escape_field(&self.to_string())
    }

    /// Inverse of [`RelPath::escaped`].
    pub fn from_escaped(value: &str) -> Result<Self, String> {
        Self::parse(&unescape_field(value)?)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<RelPath> for String {
    fn from(path: RelPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for RelPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RelPath::parse(&value)
    }
}

fn validate_segment(segment: &str) -> Result<(), String> {
    match segment {
        "" => Err("empty path segment".to_string()),
        "." | ".." => Err(format!("segment {:?} is not allowed", segment)),
        // A separator on Windows; an ordinary name character elsewhere.
        s if cfg!(windows) && s.contains('\\') => {
            Err("backslash is not allowed in path segments".to_string())
        }
        s if s.contains('\0') => Err("NUL is not allowed in path segments".to_string()),
        _ => Ok(()),
    }
}

/// Escape a header field so it fits on one artifact line.
pub fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_field`]. Unknown escapes are rejected.
pub fn unescape_field(value: &str) -> Result<String, String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        let code = rest.get(idx + 1..idx + 3).unwrap_or("");
        match code {
            "25" => out.push('%'),
            "0A" => out.push('\n'),
            "0D" => out.push('\r'),
            _ => return Err(format!("invalid escape sequence %{}", code)),
        }
        rest = &rest[idx + 3..];
    }
    out.push_str(rest);
    Ok(out)
}
