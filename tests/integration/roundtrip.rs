//! Generate an artifact, recreate it, and check the copy matches byte for byte

use dirsnap::artifact::{
    generate_to_path, recreate_from_path, ArtifactDocument, EncodingPolicy, RecreateOptions,
};
use dirsnap::compare::{Comparator, CompareOptions};
use dirsnap::tree::snapshot::TreeSnapshot;
use dirsnap::tree::walker::{PathWalker, WalkConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::integration::{sample_tree, write_tree};

fn generate(root: &Path, output: &Path, policy: EncodingPolicy) {
    let walker = PathWalker::new(root, WalkConfig::default()).unwrap();
    let report = generate_to_path(walker, output, policy, false).unwrap();
    assert!(report.skipped.is_empty());
}

fn snapshot(root: &Path) -> TreeSnapshot {
    TreeSnapshot::from_walker(&PathWalker::new(root, WalkConfig::default()).unwrap())
}

fn assert_same_bytes(left: &Path, right: &Path, rel: &str) {
    assert_eq!(
        fs::read(left.join(rel)).unwrap(),
        fs::read(right.join(rel)).unwrap(),
        "content differs for {}",
        rel
    );
}

#[test]
fn test_roundtrip_preserves_every_byte() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    sample_tree(&source);
    let artifact = temp_dir.path().join("project.txt");
    let target = temp_dir.path().join("copy");

    generate(&source, &artifact, EncodingPolicy::Auto);
    recreate_from_path(&artifact, &target, RecreateOptions::default()).unwrap();

    for rel in [
        "README.md",
        "src/main.rs",
        "src/util/mod.rs",
        "assets/logo.bin",
        "assets/latin1.txt",
        "empty.txt",
        "notes/crlf.txt",
    ] {
        assert_same_bytes(&source, &target, rel);
    }
    assert!(target.join("docs").is_dir());

    let diff = Comparator::new(CompareOptions::default()).compare(&snapshot(&source), &snapshot(&target));
    assert!(diff.is_empty(), "unexpected differences: {:?}", diff);
}

#[test]
fn test_roundtrip_with_base64_policy() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    sample_tree(&source);
    let artifact = temp_dir.path().join("project.txt");
    let target = temp_dir.path().join("copy");

    generate(&source, &artifact, EncodingPolicy::Base64);
    let text = fs::read_to_string(&artifact).unwrap();
    assert!(!text.contains(" TEXT "));

    recreate_from_path(&artifact, &target, RecreateOptions::default()).unwrap();
    assert_same_bytes(&source, &target, "README.md");
    assert_same_bytes(&source, &target, "assets/logo.bin");
}

#[test]
fn test_artifact_is_readable_text() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("demo");
    write_tree(&source, &[("a.txt", b"hello\n"), ("bin/x", &[0, 1, 2])]);
    let artifact = temp_dir.path().join("demo.txt");
    generate(&source, &artifact, EncodingPolicy::Auto);

    let text = fs::read_to_string(&artifact).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("DIRSNAP 1 "));
    assert!(lines[0].ends_with(" demo"));
    assert!(lines[1].starts_with("F 6 TEXT "));
    assert!(lines[1].ends_with(" a.txt"));
    assert_eq!(lines[2], "hello");
    assert_eq!(lines[3], "");
    assert_eq!(lines[4], "@@end");
    assert_eq!(lines[5], "D bin");
    assert!(lines[6].starts_with("F 4 BASE64 "));
    assert_eq!(lines[7], "AAEC");
}

#[test]
fn test_generation_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    sample_tree(&source);
    let first = temp_dir.path().join("one.txt");
    let second = temp_dir.path().join("two.txt");
    generate(&source, &first, EncodingPolicy::Auto);
    generate(&source, &second, EncodingPolicy::Auto);

    let body = |path: &Path| {
        let text = fs::read_to_string(path).unwrap();
        text.split_once('\n').unwrap().1.to_string()
    };
    assert_eq!(body(&first), body(&second));
    assert_eq!(
        ArtifactDocument::from_path(&first).unwrap().entries,
        ArtifactDocument::from_path(&second).unwrap().entries
    );
}

#[test]
fn test_artifact_inside_root_is_not_captured() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    write_tree(&source, &[("a.txt", b"a")]);
    let artifact = source.join("snapshot.txt");
    generate(&source, &artifact, EncodingPolicy::Auto);

    let document = ArtifactDocument::from_path(&artifact).unwrap();
    let paths: Vec<String> = document.entries.iter().map(|e| e.path.to_string()).collect();
    assert_eq!(paths, vec!["a.txt"]);
}

#[cfg(unix)]
#[test]
fn test_roundtrip_preserves_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    write_tree(&source, &[("run.sh", b"#!/bin/sh\necho hi\n")]);
    fs::set_permissions(source.join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
    let artifact = temp_dir.path().join("project.txt");
    let target = temp_dir.path().join("copy");

    generate(&source, &artifact, EncodingPolicy::Auto);
    recreate_from_path(&artifact, &target, RecreateOptions::default()).unwrap();

    let mode = fs::metadata(target.join("run.sh")).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o755);
}

#[test]
fn test_special_characters_in_names() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    write_tree(
        &source,
        &[
            ("with space.txt", b"1"),
            ("100%.txt", b"2"),
            ("caf\u{e9}/\u{65e5}\u{672c}.md", b"3"),
        ],
    );
    let artifact = temp_dir.path().join("project.txt");
    let target = temp_dir.path().join("copy");
    generate(&source, &artifact, EncodingPolicy::Auto);
    recreate_from_path(&artifact, &target, RecreateOptions::default()).unwrap();

    assert_same_bytes(&source, &target, "with space.txt");
    assert_same_bytes(&source, &target, "100%.txt");
    assert_same_bytes(&source, &target, "caf\u{e9}/\u{65e5}\u{672c}.md");
}

#[cfg(unix)]
#[test]
fn test_backslash_in_names_roundtrips() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("project");
    write_tree(&source, &[("a\\b.txt", b"kept"), ("dir\\x/y.txt", b"y")]);
    let artifact = temp_dir.path().join("project.txt");
    let target = temp_dir.path().join("copy");

    generate(&source, &artifact, EncodingPolicy::Auto);
    recreate_from_path(&artifact, &target, RecreateOptions::default()).unwrap();

    assert_same_bytes(&source, &target, "a\\b.txt");
    assert_same_bytes(&source, &target, "dir\\x/y.txt");
}
