//! Deserializer: parses artifacts into documents

use crate::artifact::format::{ArtifactHeader, Encoding, EntryLine, END_MARKER};
use crate::error::{ApiError, FormatError};
use crate::tree::entry::{EntryKind, TreeEntry};
use crate::tree::path::RelPath;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::ops::Bound;
use std::path::Path;
use tracing::{debug, instrument};

/// Sequential reader over an artifact stream.
///
/// Structural problems surface as [`ApiError::Format`]; failures of the
/// underlying stream as [`ApiError::Io`].
pub struct ArtifactReader<R> {
    inner: R,
    /// Number of the last line consumed (1-based).
    line: usize,
    /// Line of the most recent entry's `D`/`F` line.
    entry_line: usize,
}

impl<R: BufRead> ArtifactReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            entry_line: 0,
        }
    }

    /// Line number of the last line consumed.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Line on which the most recently returned entry starts.
    pub fn entry_line(&self) -> usize {
        self.entry_line
    }

    /// Read one `\n`-terminated line without its terminator.
    fn read_line(&mut self) -> Result<Option<String>, ApiError> {
        let mut buf = Vec::new();
        let read = self.inner.read_until(b'\n', &mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        self.line += 1;
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        String::from_utf8(buf).map(Some).map_err(|_| {
            FormatError::InvalidEntry {
                line: self.line,
                reason: "line is not valid UTF-8".to_string(),
            }
            .into()
        })
    }

    /// Read and validate the header line.
    pub fn read_header(&mut self) -> Result<ArtifactHeader, ApiError> {
        let line = self.read_line()?.ok_or(FormatError::MissingHeader)?;
        Ok(ArtifactHeader::parse_line(&line, self.line)?)
    }

    /// Read the next entry, `None` at end of input. Blank lines between
    /// entries are skipped.
    pub fn next_entry(&mut self) -> Result<Option<TreeEntry>, ApiError> {
        let line = loop {
            match self.read_line()? {
                None => return Ok(None),
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
            }
        };
        let entry_line_no = self.line;
        self.entry_line = entry_line_no;
        match EntryLine::parse_line(&line, entry_line_no)? {
            EntryLine::Directory { path } => Ok(Some(TreeEntry::directory(path))),
            EntryLine::File {
                length,
                encoding,
                mode,
                path,
            } => {
                let payload = self.read_payload(length, &path)?;
                let content = decode_payload(payload, encoding, &path, entry_line_no + 1)?;
                Ok(Some(TreeEntry::file(path, content, mode)))
            }
        }
    }

    fn read_payload(&mut self, length: u64, path: &RelPath) -> Result<Vec<u8>, ApiError> {
        let payload_line = self.line + 1;
        let mut payload = Vec::new();
        (&mut self.inner).take(length).read_to_end(&mut payload)?;
        if (payload.len() as u64) < length {
            return Err(FormatError::Truncated {
                line: payload_line,
                expected: length,
                found: payload.len() as u64,
            }
            .into());
        }
        // The payload's own newlines count as lines; the terminator that
        // follows it is consumed by the next read_line.
        self.line += payload.iter().filter(|b| **b == b'\n').count();
        let missing = |line: usize| FormatError::MissingDelimiter {
            line,
            path: path.to_string(),
        };
        // Terminator of the payload's last line, then the delimiter line.
        match self.read_line()? {
            Some(rest) if rest.is_empty() => {}
            _ => return Err(missing(self.line).into()),
        }
        match self.read_line()? {
            Some(marker) if marker == END_MARKER => Ok(payload),
            _ => Err(missing(self.line).into()),
        }
    }
}

fn decode_payload(
    payload: Vec<u8>,
    encoding: Encoding,
    path: &RelPath,
    line: usize,
) -> Result<Vec<u8>, FormatError> {
    match encoding {
        Encoding::Text => {
            if std::str::from_utf8(&payload).is_err() {
                return Err(FormatError::InvalidText {
                    line,
                    path: path.to_string(),
                });
            }
            Ok(payload)
        }
        Encoding::Base64 => BASE64
            .decode(&payload)
            .map_err(|e| FormatError::InvalidBase64 {
                line,
                path: path.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// A fully parsed and validated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDocument {
    pub header: ArtifactHeader,
    /// Entries in artifact order.
    pub entries: Vec<TreeEntry>,
}

impl ArtifactDocument {
    /// Parse and validate a complete artifact: paths are unique and no path is
    /// both a file and the ancestor of another entry.
    pub fn parse<R: BufRead>(input: R) -> Result<Self, ApiError> {
        let mut reader = ArtifactReader::new(input);
        let header = reader.read_header()?;
        let mut seen: BTreeMap<RelPath, EntryKind> = BTreeMap::new();
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry()? {
            validate_placement(&seen, &entry, reader.entry_line())?;
            seen.insert(entry.path.clone(), entry.kind);
            entries.push(entry);
        }

        debug!(
            root = %header.root_name,
            entries = entries.len(),
            "Parsed artifact"
        );
        Ok(Self { header, entries })
    }

    /// Open and parse an artifact file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    pub fn files(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|e| e.is_file())
    }

    pub fn directories(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|e| e.is_dir())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_placement(
    seen: &BTreeMap<RelPath, EntryKind>,
    entry: &TreeEntry,
    line: usize,
) -> Result<(), FormatError> {
    if seen.contains_key(&entry.path) {
        return Err(FormatError::DuplicatePath {
            line,
            path: entry.path.to_string(),
        });
    }
    for ancestor in entry.path.ancestors() {
        if seen.get(&ancestor) == Some(&EntryKind::File) {
            return Err(FormatError::PathConflict {
                line,
                path: entry.path.to_string(),
                file: ancestor.to_string(),
            });
        }
    }
    // Descendants sort directly after their ancestor, so checking the next
    // key is enough.
    if entry.is_file() {
        let next = seen
            .range((Bound::Excluded(&entry.path), Bound::Unbounded))
            .next();
        if let Some((descendant, _)) = next {
            if entry.path.is_ancestor_of(descendant) {
                return Err(FormatError::PathConflict {
                    line,
                    path: descendant.to_string(),
                    file: entry.path.to_string(),
                });
            }
        }
    }
    Ok(())
}
