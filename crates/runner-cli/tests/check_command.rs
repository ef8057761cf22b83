use std::fs;

use predicates::str::contains;
use tempfile::TempDir;

fn write_plan(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("plan.toml");
    fs::write(&path, content).expect("write plan");
    path
}

#[test]
fn check_prints_the_step_tree_without_running() {
    let dir = TempDir::new().expect("create temp dir");
    let plan = write_plan(
        &dir,
        r#"
[[step]]
name = "make a"
run = "touch a"
rollback = "rm a"

[[step]]
name = "group"
  [[step.steps]]
  name = "inner"
  run = "touch inner"
"#,
    );

    assert_cmd::cargo::cargo_bin_cmd!("runner")
        .arg("check")
        .arg(&plan)
        .assert()
        .success()
        .stdout(contains("is valid: 2 step(s)"))
        .stdout(contains("Shell: sh"))
        .stdout(contains("- make a [run, rollback]"))
        .stdout(contains("  - inner [run]"));

    assert!(!dir.path().join("a").exists());
    assert!(!dir.path().join("inner").exists());
}

#[test]
fn check_rejects_invalid_steps() {
    let dir = TempDir::new().expect("create temp dir");
    let plan = write_plan(&dir, "[[step]]\nname = \"broken\"\n");

    assert_cmd::cargo::cargo_bin_cmd!("runner")
        .arg("check")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(contains("error: plan error"))
        .stderr(contains("invalid step 'broken'"));
}

#[test]
fn check_rejects_malformed_toml() {
    let dir = TempDir::new().expect("create temp dir");
    let plan = write_plan(&dir, "[[step]\nname = ");

    assert_cmd::cargo::cargo_bin_cmd!("runner")
        .arg("check")
        .arg(&plan)
        .assert()
        .failure()
        .stderr(contains("failed to parse plan"));
}
