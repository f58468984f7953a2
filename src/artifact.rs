//! Single-file tree artifacts: format, serializer, deserializer and recreator.

pub mod format;
pub mod reader;
pub mod recreate;
pub mod writer;

pub use format::{ArtifactHeader, Encoding, EncodingPolicy};
pub use reader::{ArtifactDocument, ArtifactReader};
pub use recreate::{recreate_from_path, RecreateOptions, RecreateReport, Recreator};
pub use writer::{GenerateReport, Serializer};

use crate::error::{ApiError, WriteError};
use crate::tree::walker::PathWalker;
use chrono::{DateTime, Local};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Default artifact file name: `<root>_snapshot_<YYYYmmdd_HHMMSS>.txt`.
pub fn default_output_name(root_name: &str, now: DateTime<Local>) -> String {
    format!("{}_snapshot_{}.txt", root_name, now.format("%Y%m%d_%H%M%S"))
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

/// Walk `walker`'s root and write the artifact to `output`.
///
/// The artifact is written next to `output` under a `.partial` name and
/// renamed into place once complete, so a failed run never leaves a truncated
/// artifact behind. With `strict`, any skipped path fails the run.
#[instrument(skip_all, fields(root = %walker.root().display(), output = %output.display()))]
pub fn generate_to_path(
    walker: PathWalker,
    output: &Path,
    policy: EncodingPolicy,
    strict: bool,
) -> Result<GenerateReport, ApiError> {
    let partial = partial_path(output);
    let walker = walker.exclude_fs_path(output).exclude_fs_path(&partial);
    let artifact_err = |source| WriteError::Artifact {
        path: output.to_path_buf(),
        source,
    };

    let file = File::create(&partial).map_err(artifact_err)?;
    let mut out = BufWriter::new(file);
    let header = ArtifactHeader::new(walker.root_name());
    let written = Serializer::new(policy).write(&mut out, &header, walker.entries());
    drop(out);

    let report = match written {
        Ok(report) => report,
        Err(source) => {
            discard(&partial);
            return Err(artifact_err(source).into());
        }
    };

    if strict && !report.skipped.is_empty() {
        discard(&partial);
        return Err(ApiError::StrictModeViolation(report.skipped.len()));
    }

    if let Err(source) = fs::rename(&partial, output) {
        discard(&partial);
        return Err(artifact_err(source).into());
    }

    info!(
        files = report.files,
        directories = report.directories,
        bytes = report.bytes,
        skipped = report.skipped.len(),
        "Artifact written"
    );
    Ok(report)
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Could not remove partial artifact");
    }
}
