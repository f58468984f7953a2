//! Comparing directories and artifacts against each other

use dirsnap::artifact::{generate_to_path, EncodingPolicy};
use dirsnap::compare::{compare_sources, CompareOptions, ComparisonReport, Modification};
use dirsnap::error::{ApiError, ArgumentError};
use dirsnap::ignore::ExcludeRules;
use dirsnap::tree::path::RelPath;
use dirsnap::tree::walker::{PathWalker, WalkConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::integration::{sample_tree, write_tree};

fn compare(left: &Path, right: &Path) -> ComparisonReport {
    compare_with(left, right, &[])
}

fn compare_with(left: &Path, right: &Path, exclude: &[&str]) -> ComparisonReport {
    let rules = ExcludeRules::new(exclude).unwrap();
    compare_sources(
        left,
        right,
        &WalkConfig::default(),
        &rules,
        CompareOptions::default(),
    )
    .unwrap()
}

fn generate(root: &Path, output: &Path) {
    let walker = PathWalker::new(root, WalkConfig::default()).unwrap();
    generate_to_path(walker, output, EncodingPolicy::Auto, false).unwrap();
}

fn rel(s: &str) -> RelPath {
    RelPath::parse(s).unwrap()
}

#[test]
fn test_tree_matches_its_own_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    sample_tree(&source);
    let artifact = temp_dir.path().join("project.txt");
    generate(&source, &artifact);

    assert!(compare(&source, &artifact).is_identical());
    assert!(compare(&artifact, &source).is_identical());
    assert!(compare(&artifact, &artifact).is_identical());
}

#[test]
fn test_differences_are_classified() {
    let temp_dir = TempDir::new().unwrap();
    let left = temp_dir.path().join("left");
    let right = temp_dir.path().join("right");
    write_tree(
        &left,
        &[
            ("same.txt", b"same"),
            ("grown.txt", b"abc"),
            ("edited.txt", b"abc"),
            ("gone/old.txt", b"old"),
            ("swap", b"file"),
        ],
    );
    write_tree(
        &right,
        &[
            ("same.txt", b"same"),
            ("grown.txt", b"abcd"),
            ("edited.txt", b"xyz"),
            ("fresh.txt", b"new"),
            ("swap/inner.txt", b"now a dir"),
        ],
    );

    let diff = compare(&left, &right).diff;
    assert_eq!(
        diff.added.iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["fresh.txt", "swap/inner.txt"]
    );
    assert_eq!(
        diff.removed.iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["gone", "gone/old.txt"]
    );
    assert!(matches!(
        diff.modified.get(&rel("grown.txt")),
        Some(Modification::SizeChanged {
            left: 3,
            right: 4,
            ..
        })
    ));
    assert!(matches!(
        diff.modified.get(&rel("edited.txt")),
        Some(Modification::ContentChanged { size: 3, .. })
    ));
    assert!(matches!(
        diff.modified.get(&rel("swap")),
        Some(Modification::KindChanged { .. })
    ));
    assert!(!diff.modified.contains_key(&rel("same.txt")));
}

#[test]
fn test_changed_tree_differs_from_old_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    sample_tree(&source);
    let artifact = temp_dir.path().join("before.txt");
    generate(&source, &artifact);

    fs::write(source.join("README.md"), "# Changed\n").unwrap();
    fs::remove_file(source.join("empty.txt")).unwrap();

    let diff = compare(&artifact, &source).diff;
    assert!(diff.removed.contains(&rel("empty.txt")));
    assert!(diff.modified.contains_key(&rel("README.md")));
    assert!(diff.added.is_empty());
}

#[test]
fn test_exclusions_apply_to_both_sides() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    write_tree(&source, &[("keep.txt", b"k"), ("build/out.o", b"o")]);
    let artifact = temp_dir.path().join("project.txt");
    generate(&source, &artifact);

    fs::write(source.join("build/out.o"), "changed").unwrap();
    assert!(!compare(&artifact, &source).is_identical());
    assert!(compare_with(&artifact, &source, &["build"]).is_identical());
}

#[test]
fn test_empty_trees_are_identical() {
    let temp_dir = TempDir::new().unwrap();
    let left = temp_dir.path().join("left");
    let right = temp_dir.path().join("right");
    fs::create_dir(&left).unwrap();
    fs::create_dir(&right).unwrap();
    let report = compare(&left, &right);
    assert!(report.is_identical());
    assert_eq!(report.diff.total(), 0);
}

#[test]
fn test_missing_source_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = compare_sources(
        &temp_dir.path().join("nope"),
        temp_dir.path(),
        &WalkConfig::default(),
        &ExcludeRules::default(),
        CompareOptions::default(),
    );
    assert!(matches!(
        result,
        Err(ApiError::Argument(ArgumentError::InvalidSource(_)))
    ));
}

#[test]
fn test_malformed_artifact_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let bogus = temp_dir.path().join("bogus.txt");
    fs::write(&bogus, "not an artifact\n").unwrap();
    let result = compare_sources(
        &bogus,
        temp_dir.path(),
        &WalkConfig::default(),
        &ExcludeRules::default(),
        CompareOptions::default(),
    );
    assert!(matches!(result, Err(ApiError::Format(_))));
}

#[test]
fn test_artifact_stored_inside_tree_matches() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    sample_tree(&source);
    let artifact = source.join("snap.txt");
    generate(&source, &artifact);

    assert!(compare(&source, &artifact).is_identical());
    assert!(compare(&artifact, &source).is_identical());
}

#[test]
fn test_text_edit_against_artifact_reports_lines() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    write_tree(&source, &[("notes.md", b"alpha\nbeta\ngamma\n")]);
    let artifact = temp_dir.path().join("project.txt");
    generate(&source, &artifact);

    fs::write(source.join("notes.md"), "alpha\nBETA\ngamma\ndelta\n").unwrap();
    let diff = compare(&artifact, &source).diff;
    let text = diff.modified[&rel("notes.md")].line_diff().unwrap();
    assert_eq!((text.lines_added, text.lines_removed), (2, 1));
}
