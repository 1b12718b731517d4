use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn ptrack_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ptrack");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    setup_with_llm("")
}

fn setup_with_llm(llm_section: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/products.sqlite"
seed = true

[server]
bind = "127.0.0.1:8765"

{}
"#,
        root.display(),
        llm_section
    );

    let config_path = config_dir.join("ptrack.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_ptrack(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ptrack_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ptrack binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Pull the UUID out of a `created <uuid>` line.
fn created_id(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|l| l.strip_prefix("created "))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| panic!("no created line in: {}", stdout))
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_ptrack(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/products.sqlite").exists());
}

#[test]
fn test_init_idempotent_seeds_once() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_ptrack(&config_path, &["init"]);
    assert!(success1, "First init failed");
    let (_, _, success2) = run_ptrack(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");

    let (stdout, _, success) = run_ptrack(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("3 product(s)"), "stdout={}", stdout);
    assert!(stdout.contains("Product 1"));
    assert!(stdout.contains("Product 3"));
}

#[test]
fn test_add_get_delete() {
    let (_tmp, config_path) = setup_test_env();
    run_ptrack(&config_path, &["init"]);

    let (stdout, stderr, success) = run_ptrack(
        &config_path,
        &[
            "add",
            "--name",
            "Desk Lamp",
            "--price",
            "35.5",
            "--description",
            "LED lamp",
            "--quantity",
            "8",
        ],
    );
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    let id = created_id(&stdout);

    let (stdout, _, success) = run_ptrack(&config_path, &["get", &id]);
    assert!(success);
    assert!(stdout.contains("Desk Lamp"));
    assert!(stdout.contains("35.50"));
    assert!(stdout.contains("LED lamp"));

    let (stdout, _, success) = run_ptrack(&config_path, &["delete", &id]);
    assert!(success);
    assert!(stdout.contains("deleted"));

    let (_, stderr, success) = run_ptrack(&config_path, &["get", &id]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_delete_missing_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_ptrack(&config_path, &["init"]);

    let (_, stderr, success) = run_ptrack(
        &config_path,
        &["delete", "00000000-0000-0000-0000-000000000000"],
    );
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_search_errors_when_llm_disabled() {
    let (_tmp, config_path) = setup_test_env();
    run_ptrack(&config_path, &["init"]);

    let (_, stderr, success) = run_ptrack(&config_path, &["search", "cheap products"]);
    assert!(!success, "search should fail without a model");
    assert!(stderr.contains("disabled"), "stderr={}", stderr);
}

#[test]
fn test_search_empty_query_errors() {
    let (_tmp, config_path) = setup_test_env();
    run_ptrack(&config_path, &["init"]);

    let (_, stderr, success) = run_ptrack(&config_path, &["search", "  "]);
    assert!(!success);
    assert!(stderr.contains("must not be empty"));
}

#[test]
fn test_unknown_llm_provider_rejected() {
    let (_tmp, config_path) = setup_with_llm("[llm]\nprovider = \"mystery\"\nmodel = \"m\"\n");

    let (_, stderr, success) = run_ptrack(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Unknown llm provider"));
}

#[test]
fn test_missing_config_errors() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_ptrack(&tmp.path().join("nope.toml"), &["list"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
