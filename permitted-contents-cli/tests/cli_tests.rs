#![allow(clippy::unwrap_used)]
//! End-to-end tests for the `permitted-contents` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use clap::Parser;
use permitted_contents_cli::cli::{Cli, execute};
use tempfile::TempDir;

const SPEC: &str = r##"{
  "categories": {
    "#flow": ["div", "p", "#phrasing"],
    "#phrasing": ["span", "em", "#text"]
  },
  "specs": [
    { "tag": "p", "contents": [{ "zeroOrMore": "#phrasing" }] },
    { "tag": "div", "contents": [{ "zeroOrMore": "#flow" }] }
  ]
}"##;

fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("spec.json"), SPEC).unwrap();
    fs::create_dir(tmp.path().join("pages")).unwrap();
    tmp
}

fn write_page(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join("pages").join(name), content).unwrap();
}

fn binary(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_permitted-contents"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_valid_pages_exit_zero() {
    let tmp = workspace();
    write_page(tmp.path(), "index.dom.json", r#"{ "name": "div", "children": [{ "name": "p", "children": ["hi"] }] }"#);

    let out = binary(&["--spec", "spec.json", "pages"], tmp.path());
    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("All 1 files passed validation"), "got: {stdout}");
}

#[test]
fn test_invalid_pages_exit_one() {
    let tmp = workspace();
    write_page(tmp.path(), "bad.dom.json", r#"{ "name": "p", "children": [{ "name": "div" }] }"#);

    let out = binary(&["--spec", "spec.json", "--format", "json", "pages"], tmp.path());
    assert_eq!(out.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["ok"], false);
    assert_eq!(value["files"][0]["violations"][0]["tag"], "p");
}

#[test]
fn test_missing_spec_exit_two() {
    let tmp = workspace();
    let out = binary(&["--spec", "nope.json", "pages"], tmp.path());
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Failed to load spec"), "got: {stderr}");
}

#[test]
fn test_execute_with_rules() {
    let tmp = workspace();
    fs::write(
        tmp.path().join("rules.json"),
        r#"{ "rules": [{ "tag": "div", "contents": [{ "require": "p" }] }] }"#,
    )
    .unwrap();
    write_page(tmp.path(), "two.dom.json", r#"{ "name": "div", "children": [{ "name": "p" }, { "name": "p" }] }"#);

    let root = tmp.path().display().to_string();
    let cli = Cli::parse_from([
        "permitted-contents".to_owned(),
        "--spec".to_owned(),
        format!("{root}/spec.json"),
        "--rules".to_owned(),
        format!("{root}/rules.json"),
        format!("{root}/pages"),
    ]);
    let mut out = Vec::new();
    let ok = execute(&cli, &mut out).unwrap();
    assert!(!ok);
    let text = String::from_utf8(out).unwrap();
    assert!(
        text.contains("Invalid content in \"div\" element on rule settings"),
        "got: {text}"
    );
}
