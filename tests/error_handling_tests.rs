use predicates::prelude::*;
use std::fs;
use test_env::CrmEnv;

#[test]
fn test_not_found_is_user_error() {
    let env = CrmEnv::new();

    env.cmd()
        .args(["leads", "show", "7"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Lead 7 not found"));
}

#[test]
fn test_invalid_id_error() {
    let env = CrmEnv::new();

    env.cmd()
        .args(["contacts", "show", "abc"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid contact ID: 'abc'"));

    env.cmd()
        .args(["leads", "move", "1", "two", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid stage ID"));
}

#[test]
fn test_conflicts() {
    let env = CrmEnv::new();
    env.run(&["contacts", "add", "ana@example.com", "--instagram", "@ana"]);

    env.cmd()
        .args(["contacts", "add", "ANA@example.com"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Email or Instagram user already exists"));

    env.cmd()
        .args(["contacts", "add", "other@example.com", "--instagram", "ana"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    env.run(&["leads", "add", "1"]);
    env.cmd()
        .args(["leads", "add", "1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("This contact already has a lead"));

    env.run(&["pipelines", "add", "Sales"]);
    env.cmd()
        .args(["pipelines", "add", " Sales "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("A pipeline with this name already exists"));
}

#[test]
fn test_validation_errors() {
    let env = CrmEnv::new();

    env.cmd()
        .args(["contacts", "add", "not-an-email"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));

    env.cmd()
        .args(["pipelines", "add", "   "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Pipeline name is required"));

    env.cmd()
        .args(["leads", "list", "--status", "lukewarm"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid status: 'lukewarm'"));

    env.cmd()
        .args(["tasks", "add", "--due", "someday", "Call", "back"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid date: 'someday'"));
}

#[test]
fn test_unopenable_database_is_internal_error() {
    let env = CrmEnv::new();
    // point the database at a directory
    let db_dir = env.temp_dir.path().join("db-dir");
    fs::create_dir_all(&db_dir).unwrap();
    fs::write(
        env.temp_dir.path().join(".leadline").join("rc"),
        format!("data.location={}\n", db_dir.display()),
    )
    .unwrap();

    env.cmd()
        .args(["contacts", "list"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::starts_with("Internal error:"));
}

#[test]
fn test_help_is_not_an_error() {
    let env = CrmEnv::new();

    env.cmd()
        .args(["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("leads"))
        .stdout(predicate::str::contains("dashboard"));

    env.cmd().args(["--version"]).assert().success();
}
