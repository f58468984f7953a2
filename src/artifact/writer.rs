//! Serializer: writes walked entries into an artifact

use crate::artifact::format::{
    ArtifactHeader, Encoding, EncodingPolicy, EntryLine, END_MARKER,
};
use crate::error::AccessError;
use crate::tree::entry::{EntryKind, TreeEntry};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use tracing::{trace, warn};

/// Summary of one serialization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateReport {
    pub root_name: String,
    pub directories: usize,
    pub files: usize,
    pub text_files: usize,
    pub base64_files: usize,
    /// Sum of original file sizes.
    pub bytes: u64,
    /// Paths that could not be captured.
    pub skipped: Vec<AccessError>,
}

impl GenerateReport {
    pub fn entries(&self) -> usize {
        self.directories + self.files
    }
}

/// Writes artifacts in format version 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    policy: EncodingPolicy,
}

impl Serializer {
    pub fn new(policy: EncodingPolicy) -> Self {
        Self { policy }
    }

    pub fn write_header<W: Write>(&self, out: &mut W, header: &ArtifactHeader) -> io::Result<()> {
        writeln!(out, "{}", header.to_line())
    }

    /// Write one entry block. Returns the encoding used for files.
    pub fn write_entry<W: Write>(
        &self,
        out: &mut W,
        entry: &TreeEntry,
    ) -> io::Result<Option<Encoding>> {
        match entry.kind {
            EntryKind::Directory => {
                let line = EntryLine::Directory {
                    path: entry.path.clone(),
                };
                writeln!(out, "{}", line.to_line())?;
                Ok(None)
            }
            EntryKind::File => {
                let encoding = self.policy.choose(&entry.content);
                let encoded;
                let payload: &[u8] = match encoding {
                    Encoding::Text => &entry.content,
                    Encoding::Base64 => {
                        encoded = BASE64.encode(&entry.content);
                        encoded.as_bytes()
                    }
                };
                let line = EntryLine::File {
                    length: payload.len() as u64,
                    encoding,
                    mode: entry.mode,
                    path: entry.path.clone(),
                };
                writeln!(out, "{}", line.to_line())?;
                out.write_all(payload)?;
                writeln!(out)?;
                writeln!(out, "{}", END_MARKER)?;
                trace!(path = %entry.path, %encoding, size = entry.size, "Wrote file entry");
                Ok(Some(encoding))
            }
        }
    }

    /// Write a full artifact from a walk sequence. Skipped paths are collected
    /// into the report; only I/O errors on `out` abort.
    pub fn write<W, I>(
        &self,
        out: &mut W,
        header: &ArtifactHeader,
        entries: I,
    ) -> io::Result<GenerateReport>
    where
        W: Write,
        I: IntoIterator<Item = Result<TreeEntry, AccessError>>,
    {
        let mut report = GenerateReport {
            root_name: header.root_name.clone(),
            ..GenerateReport::default()
        };
        self.write_header(out, header)?;
        for item in entries {
            let entry = match item {
                Ok(entry) => entry,
                Err(skipped) => {
                    warn!("{}", skipped);
                    report.skipped.push(skipped);
                    continue;
                }
            };
            match self.write_entry(out, &entry)? {
                None => report.directories += 1,
                Some(encoding) => {
                    report.files += 1;
                    report.bytes += entry.size;
                    match encoding {
                        Encoding::Text => report.text_files += 1,
                        Encoding::Base64 => report.base64_files += 1,
                    }
                }
            }
        }
        out.flush()?;
        Ok(report)
    }

    /// Serialize entries into an in-memory artifact.
    pub fn to_bytes<I>(
        &self,
        header: &ArtifactHeader,
        entries: I,
    ) -> io::Result<(Vec<u8>, GenerateReport)>
    where
        I: IntoIterator<Item = Result<TreeEntry, AccessError>>,
    {
        let mut buf = Vec::new();
        let report = self.write(&mut buf, header, entries)?;
        Ok((buf, report))
    }
}
