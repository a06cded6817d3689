//! Integration tests for the gd CLI against a live drive
//!
//! These tests need a valid access token and create (then delete) a scratch
//! folder in the drive.
//!
//! Run with:
//! ```bash
//! export GD_TEST_ACCESS_TOKEN="$(gcloud auth print-access-token)"
//! cargo test -p gd-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const TOKEN_ENV: &str = "GD_TEST_ACCESS_TOKEN";

/// Run gd with an isolated config directory
fn run_gd(args: &[&str], config_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gd"))
        .args(args)
        .env("GD_CONFIG_DIR", config_dir)
        .env_remove("GD_PARENT")
        .output()
        .expect("Failed to execute gd")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "gd failed with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Configure a parent named `live` and a unique scratch folder
fn setup() -> Option<(TempDir, String)> {
    if std::env::var(TOKEN_ENV).is_err() {
        eprintln!("Skipping: {TOKEN_ENV} not set");
        return None;
    }
    let config_dir = tempfile::tempdir().ok()?;
    let output = run_gd(
        &["parent", "set", "live", "--token-env", TOKEN_ENV],
        config_dir.path(),
    );
    assert_success(&output);

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_nanos();
    let scratch = format!("gd-test-{nanos:x}");
    assert_success(&run_gd(&["mkdir", &scratch], config_dir.path()));
    Some((config_dir, scratch))
}

fn cleanup(config_dir: &Path, scratch: &str) {
    let _ = run_gd(&["cd", "~"], config_dir);
    let _ = run_gd(&["rm", "--force", "--yes", scratch], config_dir);
}

#[test]
fn test_parent_list_json() {
    let Some((config_dir, scratch)) = setup() else {
        return;
    };

    let output = run_gd(&["parent", "list", "--json"], config_dir.path());
    assert_success(&output);
    let parents: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parents[0]["name"], "live");
    assert_eq!(parents[0]["default"], true);

    cleanup(config_dir.path(), &scratch);
}

#[test]
fn test_push_ls_find_pull_roundtrip() {
    let Some((config_dir, scratch)) = setup() else {
        return;
    };
    let config = config_dir.path();

    let local = TempDir::new().unwrap();
    let project = local.path().join("proj");
    std::fs::create_dir_all(project.join("img")).unwrap();
    std::fs::write(project.join("readme.txt"), "hello").unwrap();
    std::fs::write(project.join("img").join("a.jpg"), "jpeg").unwrap();

    let output = run_gd(
        &["push", project.to_str().unwrap(), &scratch, "--conflict", "skip", "--json"],
        config,
    );
    assert_success(&output);
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["total_files"], 2);
    assert_eq!(report["transferred"].as_array().unwrap().len(), 2);

    assert_success(&run_gd(&["cd", &scratch], config));
    let output = run_gd(&["ls", "proj", "--depth", "all"], config);
    assert_success(&output);
    let listing = stdout(&output);
    assert!(listing.contains("F  img/a.jpg"));
    assert!(listing.contains("F  readme.txt"));

    let output = run_gd(&["find", "*.jpg", "--json"], config);
    assert_success(&output);
    let found: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(found["entries"][0]["path"], "proj/img/a.jpg");

    let download = TempDir::new().unwrap();
    let output = run_gd(
        &["pull", "proj", download.path().to_str().unwrap(), "--conflict", "overwrite"],
        config,
    );
    assert_success(&output);
    assert_eq!(
        std::fs::read_to_string(download.path().join("proj").join("readme.txt")).unwrap(),
        "hello"
    );

    cleanup(config, &scratch);
}

#[test]
fn test_missing_path_exit_code() {
    let Some((config_dir, scratch)) = setup() else {
        return;
    };

    let output = run_gd(&["ls", &format!("{scratch}/does-not-exist")], config_dir.path());
    assert_eq!(output.status.code(), Some(5));

    let output = run_gd(&["find", "*.jpg and"], config_dir.path());
    assert_eq!(output.status.code(), Some(2));

    cleanup(config_dir.path(), &scratch);
}
