//! Integration tests for the erd CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get the erd binary
#[allow(deprecated)]
fn erd_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("erd").unwrap();
    cmd.current_dir(dir)
        .env_remove("ERD_DATABASE_URL")
        .env_remove("SCHEMA")
        .env_remove("RUST_LOG");
    cmd
}

/// Initialize a project and add two migrations
fn project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    erd_cmd(temp_dir.path()).arg("init").assert().success();

    let migrate = temp_dir.path().join("db/migrate");
    fs::write(
        migrate.join("001_create_users.sql"),
        "-- migrate:up\nCREATE TABLE users (id INTEGER PRIMARY KEY);\n\n-- migrate:down\nDROP TABLE users;\n",
    )
    .unwrap();
    fs::write(
        migrate.join("002_add_posts.sql"),
        "-- migrate:up\nCREATE TABLE posts (id INTEGER PRIMARY KEY);\n\n-- migrate:down\nDROP TABLE posts;\n",
    )
    .unwrap();
    temp_dir
}

fn status_json(dir: &Path) -> serde_json::Value {
    let output = erd_cmd(dir).args(["status", "--json"]).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_command() {
    let temp_dir = TempDir::new().unwrap();
    erd_cmd(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Track and run schema migrations"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("generate"));
}

#[test]
fn test_version_command() {
    let temp_dir = TempDir::new().unwrap();
    erd_cmd(temp_dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("Version"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_init_creates_project_structure() {
    let temp_dir = TempDir::new().unwrap();

    erd_cmd(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized successfully"));

    assert!(temp_dir.path().join("erd.toml").exists(), "erd.toml should exist");
    assert!(
        temp_dir.path().join("db/migrate").is_dir(),
        "db/migrate directory should exist"
    );
    assert!(temp_dir.path().join("db/development.sqlite3").exists());
}

#[test]
fn test_status_lists_pending_migrations() {
    let temp_dir = project();

    erd_cmd(temp_dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("create_users"))
        .stdout(predicate::str::contains("add_posts"))
        .stdout(predicate::str::contains("0 applied, 2 pending"));
}

#[test]
fn test_up_then_status() {
    let temp_dir = project();

    erd_cmd(temp_dir.path())
        .args(["up", "001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 up"));

    let status = status_json(temp_dir.path());
    assert_eq!(status[0]["version"], "001");
    assert_eq!(status[0]["status"], "up");
    assert_eq!(status[1]["version"], "002");
    assert_eq!(status[1]["status"], "down");

    let schema = fs::read_to_string(temp_dir.path().join("db/schema.sql")).unwrap();
    assert!(schema.contains("CREATE TABLE users"));
}

#[test]
fn test_down_accepts_filenames() {
    let temp_dir = project();

    erd_cmd(temp_dir.path())
        .args(["run", "--up", "001,002"])
        .assert()
        .success();

    erd_cmd(temp_dir.path())
        .args(["down", "db/migrate/002_add_posts.sql", "001_create_users.sql"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 down"));

    let status = status_json(temp_dir.path());
    assert_eq!(status[0]["status"], "down");
    assert_eq!(status[1]["status"], "down");
}

#[test]
fn test_invalid_version_fails() {
    let temp_dir = project();

    erd_cmd(temp_dir.path())
        .args(["up", "abc_foo.rb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("abc_foo.rb"));
}

#[test]
fn test_dry_run_applies_nothing() {
    let temp_dir = project();

    erd_cmd(temp_dir.path())
        .args(["up", "001", "002", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"));

    let status = status_json(temp_dir.path());
    assert_eq!(status[0]["status"], "down");
    assert!(!temp_dir.path().join("db/schema.sql").exists());
}

#[test]
fn test_status_reports_orphans() {
    let temp_dir = project();

    erd_cmd(temp_dir.path()).args(["up", "002"]).assert().success();
    fs::remove_file(temp_dir.path().join("db/migrate/002_add_posts.sql")).unwrap();

    let status = status_json(temp_dir.path());
    assert_eq!(status[1]["version"], "002");
    assert_eq!(status[1]["status"], "up");
    assert_eq!(status[1]["name"], "*** NO FILE ***");
}

#[test]
fn test_schema_env_overrides_snapshot_path() {
    let temp_dir = project();
    let target = temp_dir.path().join("custom/schema.sql");

    erd_cmd(temp_dir.path())
        .env("SCHEMA", &target)
        .args(["up", "001"])
        .assert()
        .success();

    assert!(target.exists());
    assert!(!temp_dir.path().join("db/schema.sql").exists());
}

#[test]
fn test_generate_migration() {
    let temp_dir = project();

    erd_cmd(temp_dir.path())
        .args(["generate", "migration", "AddEmailToUsers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_add_email_to_users.sql"));

    let created: Vec<_> = fs::read_dir(temp_dir.path().join("db/migrate"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with("_add_email_to_users.sql"))
        .collect();
    assert_eq!(created.len(), 1);
}

#[test]
fn test_generate_model() {
    let temp_dir = project();

    erd_cmd(temp_dir.path())
        .args(["generate", "model", "Comment", "body:text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_create_comments.sql"));

    assert!(temp_dir.path().join("models/comment.toml").exists());
}

#[test]
fn test_status_without_tracking_table_fails() {
    let temp_dir = TempDir::new().unwrap();

    erd_cmd(temp_dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Version store unavailable"));

    assert!(
        !temp_dir.path().join("db").exists(),
        "status must not create the database"
    );
}

#[test]
fn test_status_without_tracking_table_in_existing_database() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("db")).unwrap();

    // An empty file is a valid, empty SQLite database.
    fs::write(temp_dir.path().join("db/development.sqlite3"), "").unwrap();

    erd_cmd(temp_dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Version store unavailable"));
}
