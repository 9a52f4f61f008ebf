//! End-to-end runs of the `fsimage-export` binary.

use std::path::Path;
use std::process::{Command, Output};

use fsimage_harness::{SAMPLE_PATHS, sample_namespace};

const BIN: &str = env!("CARGO_BIN_EXE_fsimage-export");

fn export(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env_remove("FSIMAGE_PATH")
        .env_remove("FSIMAGE_OUTPUT")
        .env_remove("FSIMAGE_LOG")
        .output()
        .expect("spawn fsimage-export")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

// ─── Row export ─────────────────────────────────────────────────────────

#[test]
fn tsv_rows_follow_walk_order() {
    let image = sample_namespace().write_temp().unwrap();
    let output = export(&[path_str(image.path())]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let text = stdout_of(&output);
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert_eq!(header.split('\t').count(), 12);
    let paths: Vec<&str> = lines.map(|line| line.split('\t').next().unwrap()).collect();
    assert_eq!(paths, SAMPLE_PATHS);
}

#[test]
fn symlink_row_carries_only_the_path() {
    let image = sample_namespace().write_temp().unwrap();
    let output = export(&[path_str(image.path())]);
    let text = stdout_of(&output);
    let symlink = text
        .lines()
        .find(|line| line.starts_with("/user/alice/latest\t"))
        .unwrap();
    assert_eq!(
        symlink,
        "/user/alice/latest\t0\t\t\t0\t0\t0\t0\t0\t\t\t"
    );
}

#[test]
fn json_lines_to_file() {
    let image = sample_namespace().write_temp().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("rows.jsonl");
    let output = export(&[
        "--format=jsonl",
        "--parallel",
        "-o",
        path_str(&target),
        path_str(image.path()),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert!(output.stdout.is_empty());

    let written = std::fs::read_to_string(&target).unwrap();
    assert_eq!(written.lines().count(), SAMPLE_PATHS.len());
    let first = written.lines().next().unwrap();
    assert!(first.starts_with(r#"{"Path":"/","Replication":0,"#));
}

#[test]
fn input_path_from_environment() {
    let image = sample_namespace().write_temp().unwrap();
    let output = Command::new(BIN)
        .env("FSIMAGE_PATH", image.path())
        .env_remove("FSIMAGE_OUTPUT")
        .env_remove("FSIMAGE_LOG")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(stdout_of(&output).lines().count(), 1 + SAMPLE_PATHS.len());
}

// ─── Summary ────────────────────────────────────────────────────────────

#[test]
fn summary_reports_sections_and_counts() {
    let image = sample_namespace().write_temp().unwrap();
    let output = export(&["--summary", path_str(image.path())]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["inodes"], 7);
    assert_eq!(summary["edges"], 6);
    let names: Vec<&str> = summary["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|section| section["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"INODE"));
    assert!(names.contains(&"INODE_DIR"));
}

// ─── Failures ───────────────────────────────────────────────────────────

#[test]
fn missing_file_exits_cant_open() {
    let dir = tempfile::tempdir().unwrap();
    let output = export(&[path_str(&dir.path().join("fsimage_absent"))]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr_of(&output).contains("hint:"));
    assert!(output.stdout.is_empty());
}

#[test]
fn compressed_image_exits_unsupported() {
    let mut builder = sample_namespace();
    builder.codec("org.apache.hadoop.io.compress.GzipCodec");
    let image = builder.write_temp().unwrap();
    let output = export(&[path_str(image.path())]);
    assert_eq!(output.status.code(), Some(7));
    assert!(stderr_of(&output).contains("GzipCodec"));
}

#[test]
fn missing_section_exits_not_found() {
    let mut builder = sample_namespace();
    builder.omit_section("INODE_DIR");
    let image = builder.write_temp().unwrap();
    let output = export(&[path_str(image.path())]);
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn usage_errors_exit_two() {
    assert_eq!(export(&[]).status.code(), Some(2));
    assert_eq!(export(&["--format", "xml", "img"]).status.code(), Some(2));
    assert_eq!(export(&["a", "b", "c"]).status.code(), Some(2));
}

#[test]
fn unknown_option_prints_hint_and_usage() {
    let output = export(&["--bogus"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("error: invalid argument: unknown option `--bogus`"));
    assert!(stderr.contains("hint: Run with --help for usage"));
    assert!(stderr.contains("Usage: fsimage-export"));
}

#[test]
fn help_exits_zero() {
    let output = export(&["-h"]);
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("--summary"));
}
