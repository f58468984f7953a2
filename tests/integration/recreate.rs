//! Recreating trees from hand-written and generated artifacts

use dirsnap::artifact::{recreate_from_path, RecreateOptions};
use dirsnap::error::{ApiError, FormatError, WriteError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_artifact(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("artifact.txt");
    fs::write(&path, format!("DIRSNAP 1 2024-05-01T12:00:00Z proj\n{}", body)).unwrap();
    path
}

fn recreate(artifact: &Path, target: &Path) -> Result<(), ApiError> {
    recreate_from_path(artifact, target, RecreateOptions::default()).map(|_| ())
}

#[test]
fn test_payload_with_delimiter_lookalike() {
    let temp_dir = TempDir::new().unwrap();
    let content = "first\n@@end\nD fake\n";
    let artifact = write_artifact(
        temp_dir.path(),
        &format!("F {} TEXT - tricky.txt\n{}\n@@end\n", content.len(), content),
    );
    let target = temp_dir.path().join("out");
    recreate(&artifact, &target).unwrap();

    assert_eq!(fs::read_to_string(target.join("tricky.txt")).unwrap(), content);
    assert!(!target.join("fake").exists());
}

#[test]
fn test_payload_without_trailing_newline() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = write_artifact(temp_dir.path(), "F 3 TEXT - a.txt\nabc\n@@end\n");
    let target = temp_dir.path().join("out");
    recreate(&artifact, &target).unwrap();
    assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"abc");
}

#[test]
fn test_escaped_paths() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = write_artifact(
        temp_dir.path(),
        "D dir with space\nF 1 TEXT - dir with space/100%25.txt\nx\n@@end\n",
    );
    let target = temp_dir.path().join("out");
    recreate(&artifact, &target).unwrap();
    assert_eq!(
        fs::read(target.join("dir with space").join("100%.txt")).unwrap(),
        b"x"
    );
}

#[test]
fn test_truncated_artifact_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = write_artifact(
        temp_dir.path(),
        "D a\nF 1 TEXT - a/ok.txt\nx\n@@end\nF 100 TEXT - a/cut.txt\nshort",
    );
    let target = temp_dir.path().join("out");
    let result = recreate(&artifact, &target);
    assert!(matches!(
        result,
        Err(ApiError::Format(FormatError::Truncated { .. }))
    ));
    assert!(!target.exists());
}

#[test]
fn test_traversal_path_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = write_artifact(temp_dir.path(), "F 1 TEXT - ../escape.txt\nx\n@@end\n");
    let target = temp_dir.path().join("out");
    let result = recreate(&artifact, &target);
    assert!(matches!(
        result,
        Err(ApiError::Format(FormatError::InvalidPath { .. }))
    ));
    assert!(!temp_dir.path().join("escape.txt").exists());
    assert!(!target.exists());
}

#[test]
fn test_duplicate_path_rejected_with_line() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = write_artifact(
        temp_dir.path(),
        "F 1 TEXT - a.txt\nx\n@@end\nF 1 TEXT - a.txt\ny\n@@end\n",
    );
    let err = recreate(&artifact, &temp_dir.path().join("out")).unwrap_err();
    match err {
        ApiError::Format(FormatError::DuplicatePath { line, path }) => {
            assert_eq!(line, 5);
            assert_eq!(path, "a.txt");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_non_empty_target_requires_force() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = write_artifact(temp_dir.path(), "F 3 TEXT - a.txt\nnew\n@@end\n");
    let target = temp_dir.path().join("out");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("a.txt"), "old").unwrap();
    fs::write(target.join("other.txt"), "keep").unwrap();

    let result = recreate(&artifact, &target);
    assert!(matches!(
        result,
        Err(ApiError::Write(WriteError::TargetNotEmpty(_)))
    ));
    assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "old");

    recreate_from_path(
        &artifact,
        &target,
        RecreateOptions {
            allow_existing: true,
        },
    )
    .unwrap();
    assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "new");
    assert_eq!(fs::read_to_string(target.join("other.txt")).unwrap(), "keep");
}

#[test]
fn test_empty_existing_target_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let artifact = write_artifact(temp_dir.path(), "D only\n");
    let target = temp_dir.path().join("out");
    fs::create_dir(&target).unwrap();
    let report = recreate_from_path(&artifact, &target, RecreateOptions::default()).unwrap();
    assert_eq!(report.directories_created, 1);
    assert!(target.join("only").is_dir());
}

#[test]
fn test_missing_artifact_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = recreate(
        &temp_dir.path().join("missing.txt"),
        &temp_dir.path().join("out"),
    );
    assert!(result.is_err());
    assert!(!temp_dir.path().join("out").exists());
}
