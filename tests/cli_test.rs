//! CLI integration tests
//!
//! These run the compiled binary and check exit codes and output formats.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bomscan(args: &[&str], output_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bomscan"))
        .args(args)
        .env("BOMSCAN_OUTPUT_DIR", output_dir)
        .env("BOMSCAN_TOOLS_DIR", output_dir.join("tools"))
        .env_remove("BOMSCAN_INCLUDED_RULES")
        .env_remove("BOMSCAN_EXCLUDED_RULES")
        .env_remove("BOMSCAN_MAX_DEPTH")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute bomscan")
}

fn create_go_repo(dir: &TempDir) {
    fs::write(
        dir.path().join("go.mod"),
        "module example.com/app\n\ngo 1.21\n\nrequire (\n\tgithub.com/pkg/errors v0.9.1\n\tgolang.org/x/text v0.14.0 // indirect\n)\n",
    )
    .expect("Failed to write go.mod");
}

#[test]
fn test_cli_help() {
    let work = TempDir::new().unwrap();
    let output = bomscan(&["--help"], work.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("bomscan"));
    assert!(stdout.contains("scan"));
    assert!(stdout.contains("rules"));
}

#[test]
fn test_cli_version() {
    let work = TempDir::new().unwrap();
    let output = bomscan(&["--version"], work.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_scan_json_output() {
    let repo = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    create_go_repo(&repo);

    let path = repo.path().to_string_lossy().to_string();
    let output = bomscan(&["-q", "scan", &path, "--format", "json"], work.path());

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(summary["counts"]["extracted"], 1);
    assert_eq!(summary["applicable"][0]["rules"][0], "go-mod");

    let dependencies = summary["dependencies"].as_array().unwrap();
    assert_eq!(dependencies.len(), 2);
    assert_eq!(dependencies[0]["forge"], "golang");
    assert_eq!(dependencies[1]["direct"], false);
}

#[test]
fn test_scan_human_output_to_file() {
    let repo = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    create_go_repo(&repo);
    let report = work.path().join("report.txt");

    let path = repo.path().to_string_lossy().to_string();
    let report_arg = report.to_string_lossy().to_string();
    let output = bomscan(&["-q", "scan", &path, "-o", &report_arg], work.path());

    assert!(output.status.success());
    let content = fs::read_to_string(&report).unwrap();
    assert!(content.contains("Applicable rules:"));
    assert!(content.contains("go-mod"));
    assert!(content.contains("golang:github.com/pkg/errors@v0.9.1"));
}

#[test]
fn test_excluded_rule_is_not_extracted() {
    let repo = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    create_go_repo(&repo);

    let path = repo.path().to_string_lossy().to_string();
    let output = bomscan(
        &["-q", "scan", &path, "--format", "json", "--exclude-rule", "Go"],
        work.path(),
    );

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["counts"]["applicable"], 0);
    assert!(summary["dependencies"].as_array().unwrap().is_empty());
}

#[test]
fn test_missing_path_fails() {
    let work = TempDir::new().unwrap();
    let missing = work.path().join("does-not-exist");

    let path = missing.to_string_lossy().to_string();
    let output = bomscan(&["-q", "scan", &path], work.path());

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"));
}

#[test]
fn test_invalid_config_fails() {
    let repo = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();

    let path = repo.path().to_string_lossy().to_string();
    let output = bomscan(
        &["-q", "scan", &path, "--include-rule", "go-mod", "--exclude-rule", "go-mod"],
        work.path(),
    );

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_rules_listing() {
    let work = TempDir::new().unwrap();
    let output = bomscan(&["rules", "--format", "json"], work.path());

    assert!(output.status.success());
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = rules
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["go-mod", "go-dep-lock", "gradle-inspector", "gradle-parse"]);
    assert_eq!(rules[1]["yields_to"][0], "go-mod");
    assert_eq!(rules[3]["fallback_for"], "gradle-inspector");
}
