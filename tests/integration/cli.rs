//! End-to-end runs of the dirsnap binary: output streams and exit codes

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

use crate::integration::{sample_tree, write_tree};

/// Run the binary in `cwd` with an isolated config home.
fn dirsnap(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dirsnap"))
        .args(args)
        .current_dir(cwd)
        .env("HOME", cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".config"))
        .env_remove("DIRSNAP_ENV")
        .env_remove("DIRSNAP_LOG")
        .env_remove("DIRSNAP__WALK__MAX_DEPTH")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_generate_recreate_compare_exit_codes() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path();
    sample_tree(&cwd.join("project"));

    let out = dirsnap(cwd, &["generate", "project", "snap.txt"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("snap.txt"));

    let out = dirsnap(cwd, &["recreate", "snap.txt", "copy"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));

    let out = dirsnap(cwd, &["compare", "project", "copy"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).contains("No differences"));

    fs::write(cwd.join("copy/extra.txt"), "more").unwrap();
    let out = dirsnap(cwd, &["compare", "snap.txt", "copy"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("+ extra.txt"));
}

#[test]
fn test_compare_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path();
    write_tree(&cwd.join("left"), &[("a.txt", b"a")]);
    write_tree(&cwd.join("right"), &[("b.txt", b"b")]);

    let out = dirsnap(cwd, &["compare", "left", "right", "--format", "json"]);
    assert_eq!(out.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(json["identical"], false);
    assert_eq!(json["added"][0], "b.txt");
    assert_eq!(json["removed"][0], "a.txt");
}

#[test]
fn test_errors_exit_with_two() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path();

    let out = dirsnap(cwd, &["generate", "missing"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Error:"));

    fs::write(cwd.join("bad.txt"), "DIRSNAP 9 2024-01-01T00:00:00Z x\n").unwrap();
    let out = dirsnap(cwd, &["recreate", "bad.txt", "out"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("version"));
    assert!(!cwd.join("out").exists());

    let out = dirsnap(cwd, &["no-such-command"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_recreate_refuses_non_empty_target() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path();
    write_tree(&cwd.join("project"), &[("a.txt", b"new")]);
    write_tree(&cwd.join("target"), &[("a.txt", b"old")]);

    assert_eq!(
        dirsnap(cwd, &["generate", "project", "snap.txt"]).status.code(),
        Some(0)
    );
    let out = dirsnap(cwd, &["recreate", "snap.txt", "target"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("--force"));
    assert_eq!(fs::read_to_string(cwd.join("target/a.txt")).unwrap(), "old");

    let out = dirsnap(cwd, &["recreate", "snap.txt", "target", "--force"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(fs::read_to_string(cwd.join("target/a.txt")).unwrap(), "new");
}

#[cfg(unix)]
#[test]
fn test_skipped_paths_warn_and_strict_fails() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path();
    let root = cwd.join("project");
    write_tree(&root, &[("real.txt", b"x")]);
    std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();

    let out = dirsnap(cwd, &["generate", "project", "snap.txt"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(stderr(&out).contains("warning:"));
    assert!(stderr(&out).contains("link.txt"));

    let out = dirsnap(cwd, &["generate", "project", "strict.txt", "--strict"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(!cwd.join("strict.txt").exists());
}

#[test]
fn test_tree_command() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path();
    write_tree(&cwd.join("project"), &[("src/lib.rs", b""), ("Cargo.toml", b"")]);

    let out = dirsnap(cwd, &["tree", "project"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        stdout(&out),
        "project/\n├── src/\n│   └── lib.rs\n└── Cargo.toml\n"
    );
}

#[test]
fn test_local_config_file_applies() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path();
    write_tree(&cwd.join("project"), &[("a.txt", b"a"), ("b.log", b"b")]);
    fs::write(cwd.join("dirsnap.toml"), "[walk]\nexclude = [\"*.log\"]\n").unwrap();

    let out = dirsnap(cwd, &["tree", "project"]);
    assert_eq!(stdout(&out), "project/\n└── a.txt\n");

    let out = dirsnap(cwd, &["config"]);
    assert!(stdout(&out).contains("*.log"));
}
