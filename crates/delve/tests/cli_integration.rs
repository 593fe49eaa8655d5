//! CLI integration tests for the Delve command-line interface.
//!
//! These tests never reach the network: they cover help output, argument
//! parsing, configuration commands and the paths that return before any
//! model call.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the delve binary, isolated from the user's
/// configuration and credentials.
fn delve(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("delve").unwrap();
    cmd.current_dir(dir.path())
        .env("DELVE_CONFIG_DIR", dir.path())
        .env_remove("GEMINI_API_KEY");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Delve"))
        .stdout(predicate::str::contains("research"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("tools"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("delve"));
}

#[test]
fn test_research_help_lists_options() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .args(["research", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-iterations"))
        .stdout(predicate::str::contains("--search-temperature"))
        .stdout(predicate::str::contains("--output"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Research Command Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_research_requires_query() {
    let dir = TempDir::new().unwrap();
    delve(&dir).arg("research").assert().failure();
}

#[test]
fn test_research_blank_query() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .args(["research", "   "])
        .env("GEMINI_API_KEY", "test-key")
        .assert()
        .success()
        .stdout(predicate::str::contains("Please provide a research query"));
}

#[test]
fn test_research_without_api_key() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .args(["research", "rust async runtimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn test_research_rejects_out_of_range_iterations() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .args(["research", "q", "--max-iterations", "9"])
        .env("GEMINI_API_KEY", "test-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_iterations"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config and Tools Commands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_uses_project_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("delve.toml"),
        "[research]\nmodel = \"gemini-1.5-pro\"\nmax_iterations = 4\n",
    )
    .unwrap();

    delve(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-1.5-pro"))
        .stdout(predicate::str::contains("max_iterations"))
        .stdout(predicate::str::contains("not set"));
}

#[test]
fn test_config_show_never_prints_key() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .args(["config", "show"])
        .env("GEMINI_API_KEY", "super-secret-value")
        .assert()
        .success()
        .stdout(predicate::str::contains("env var GEMINI_API_KEY"))
        .stdout(predicate::str::contains("super-secret-value").not());
}

#[test]
fn test_tools_lists_analyze() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"));
}

#[test]
fn test_tools_json() {
    let dir = TempDir::new().unwrap();
    delve(&dir)
        .args(["tools", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"analyze\""))
        .stdout(predicate::str::contains("\"required\""));
}
