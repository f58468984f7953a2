//! Artifact text format, version 1.
//!
//! ```text
//! DIRSNAP 1 <rfc3339-timestamp> <root-name>
//! D <path>
//! F <byte-length> <TEXT|BASE64> <octal-mode|-> <path>
//! <byte-length bytes of payload>
//! @@end
//! ```
//!
//! Payloads are length-prefixed, so their content never has to be escaped;
//! the `@@end` line after each payload only detects corruption. Paths and the
//! root name escape `%`, LF and CR.

use crate::error::FormatError;
use crate::tree::entry::EntryKind;
use crate::tree::path::{escape_field, unescape_field, RelPath};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAGIC: &str = "DIRSNAP";
pub const FORMAT_VERSION: u32 = 1;
pub const END_MARKER: &str = "@@end";

/// How a file payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "TEXT")]
    Text,
    #[serde(rename = "BASE64")]
    Base64,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Text => "TEXT",
            Encoding::Base64 => "BASE64",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TEXT" => Some(Encoding::Text),
            "BASE64" => Some(Encoding::Base64),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding selection for generated artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPolicy {
    /// TEXT for UTF-8 without NUL bytes, BASE64 otherwise
    #[default]
    Auto,
    /// BASE64 for every file
    Base64,
}

impl EncodingPolicy {
    pub fn choose(self, content: &[u8]) -> Encoding {
        match self {
            EncodingPolicy::Base64 => Encoding::Base64,
            EncodingPolicy::Auto if is_text(content) => Encoding::Text,
            EncodingPolicy::Auto => Encoding::Base64,
        }
    }
}

/// Text means valid UTF-8 with no NUL bytes.
pub fn is_text(content: &[u8]) -> bool {
    !content.contains(&0) && std::str::from_utf8(content).is_ok()
}

/// First line of every artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHeader {
    pub version: u32,
    pub root_name: String,
    pub generated_at: DateTime<Utc>,
}

impl ArtifactHeader {
    /// Header for a run starting now, with second precision.
    pub fn new(root_name: impl Into<String>) -> Self {
        let now = Utc::now();
        let generated_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        Self {
            version: FORMAT_VERSION,
            root_name: root_name.into(),
            generated_at,
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            MAGIC,
            self.version,
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            escape_field(&self.root_name)
        )
    }

    pub fn parse_line(line: &str, line_no: usize) -> Result<Self, FormatError> {
        let invalid = |reason: String| FormatError::InvalidHeader {
            line: line_no,
            reason,
        };
        let mut fields = line.splitn(4, ' ');
        let magic = fields.next().unwrap_or_default();
        if magic != MAGIC {
            return Err(invalid(format!("expected {:?}, found {:?}", MAGIC, magic)));
        }
        let version_str = fields
            .next()
            .ok_or_else(|| invalid("missing version".to_string()))?;
        let version: u32 = version_str
            .parse()
            .map_err(|_| invalid(format!("invalid version {:?}", version_str)))?;
        if version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                line: line_no,
                version: version_str.to_string(),
            });
        }
        let timestamp = fields
            .next()
            .ok_or_else(|| invalid("missing timestamp".to_string()))?;
        let generated_at = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| invalid(format!("invalid timestamp {:?}: {}", timestamp, e)))?
            .with_timezone(&Utc);
        let root_name = fields
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| invalid("missing root name".to_string()))?;
        let root_name = unescape_field(root_name).map_err(invalid)?;
        Ok(Self {
            version,
            root_name,
            generated_at,
        })
    }
}

/// A parsed `D` or `F` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLine {
    Directory {
        path: RelPath,
    },
    File {
        length: u64,
        encoding: Encoding,
        mode: Option<u32>,
        path: RelPath,
    },
}

impl EntryLine {
    pub fn path(&self) -> &RelPath {
        match self {
            EntryLine::Directory { path } | EntryLine::File { path, .. } => path,
        }
    }

    pub fn to_line(&self) -> String {
        match self {
            EntryLine::Directory { path } => {
                format!("{} {}", EntryKind::Directory.marker(), path.escaped())
            }
            EntryLine::File {
                length,
                encoding,
                mode,
                path,
            } => {
                let mode = mode
                    .map(|m| format!("{:o}", m))
                    .unwrap_or_else(|| "-".to_string());
                format!(
                    "{} {} {} {} {}",
                    EntryKind::File.marker(),
                    length,
                    encoding,
                    mode,
                    path.escaped()
                )
            }
        }
    }

    pub fn parse_line(line: &str, line_no: usize) -> Result<Self, FormatError> {
        let invalid = |reason: String| FormatError::InvalidEntry {
            line: line_no,
            reason,
        };
        let parse_path = |raw: &str| {
            RelPath::from_escaped(raw).map_err(|reason| FormatError::InvalidPath {
                line: line_no,
                path: raw.to_string(),
                reason,
            })
        };

        match line.split_once(' ') {
            Some(("D", raw_path)) => Ok(EntryLine::Directory {
                path: parse_path(raw_path)?,
            }),
            Some(("F", rest)) => {
                let mut fields = rest.splitn(4, ' ');
                let (Some(length), Some(encoding), Some(mode), Some(raw_path)) =
                    (fields.next(), fields.next(), fields.next(), fields.next())
                else {
                    return Err(invalid(
                        "file entry needs length, encoding, mode and path".to_string(),
                    ));
                };
                let length: u64 = length
                    .parse()
                    .map_err(|_| invalid(format!("invalid length {:?}", length)))?;
                let encoding = Encoding::parse(encoding)
                    .ok_or_else(|| invalid(format!("unknown encoding {:?}", encoding)))?;
                let mode = match mode {
                    "-" => None,
                    octal => Some(
                        u32::from_str_radix(octal, 8)
                            .ok()
                            .filter(|m| *m <= 0o7777)
                            .ok_or_else(|| invalid(format!("invalid mode {:?}", octal)))?,
                    ),
                };
                Ok(EntryLine::File {
                    length,
                    encoding,
                    mode,
                    path: parse_path(raw_path)?,
                })
            }
            _ => Err(invalid(format!(
                "expected a line starting with 'D ' or 'F ', found {:?}",
                truncate_for_error(line)
            ))),
        }
    }
}

fn truncate_for_error(line: &str) -> String {
    const MAX: usize = 60;
    if line.chars().count() <= MAX {
        line.to_string()
    } else {
        let cut: String = line.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}
