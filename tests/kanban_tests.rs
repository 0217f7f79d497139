use predicates::prelude::*;
use test_env::CrmEnv;

const NEW: i64 = 1;
const QUALIFIED: i64 = 2;

#[test]
fn test_leads_append_to_stage() {
    let env = CrmEnv::new();
    env.seed_pipeline();

    let a = env.add_lead("a@example.com", Some("1"));
    let b = env.add_lead("b@example.com", Some("1"));
    let loose = env.add_lead("c@example.com", None);

    assert_eq!(env.column("1", NEW), vec![(a, 0), (b, 1)]);
    let lead = env.json(&["leads", "show", &loose.to_string(), "--json"]);
    assert!(lead["lead"]["stage_id"].is_null());
    assert!(lead["lead"]["position"].is_null());
}

#[test]
fn test_move_across_stages() {
    let env = CrmEnv::new();
    env.seed_pipeline();
    let a0 = env.add_lead("a0@example.com", Some("1"));
    let a1 = env.add_lead("a1@example.com", Some("1"));
    let a2 = env.add_lead("a2@example.com", Some("1"));
    let b0 = env.add_lead("b0@example.com", Some("2"));

    env.cmd()
        .args(["leads", "move", &a1.to_string(), "2", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Moved lead {} to stage 2 at position 0", a1)));

    assert_eq!(env.column("1", NEW), vec![(a0, 0), (a2, 1)]);
    assert_eq!(env.column("1", QUALIFIED), vec![(a1, 0), (b0, 1)]);
}

#[test]
fn test_move_within_stage() {
    let env = CrmEnv::new();
    env.seed_pipeline();
    let x = env.add_lead("x@example.com", Some("1"));
    let y = env.add_lead("y@example.com", Some("1"));
    let z = env.add_lead("z@example.com", Some("1"));

    env.run(&["leads", "move", &x.to_string(), "1", "2"]);
    assert_eq!(env.column("1", NEW), vec![(y, 0), (z, 1), (x, 2)]);

    env.run(&["leads", "move", &x.to_string(), "1", "0"]);
    assert_eq!(env.column("1", NEW), vec![(x, 0), (y, 1), (z, 2)]);
}

#[test]
fn test_move_off_board_and_back() {
    let env = CrmEnv::new();
    env.seed_pipeline();
    let a = env.add_lead("a@example.com", Some("1"));
    let b = env.add_lead("b@example.com", Some("1"));
    let c = env.add_lead("c@example.com", Some("1"));

    env.cmd()
        .args(["leads", "move", &b.to_string(), "none", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed lead"));
    assert_eq!(env.column("1", NEW), vec![(a, 0), (c, 1)]);

    // far past the end clamps to an append
    env.run(&["leads", "move", &b.to_string(), "3", "99"]);
    env.run(&["leads", "move", &a.to_string(), "3", "99"]);
    assert_eq!(env.column("1", 3), vec![(b, 0), (a, 1)]);
    assert_eq!(env.column("1", NEW), vec![(c, 0)]);
}

#[test]
fn test_move_json_outcome() {
    let env = CrmEnv::new();
    env.seed_pipeline();
    let a = env.add_lead("a@example.com", Some("1"));

    env.cmd()
        .args(["leads", "move", &a.to_string(), "2", "0", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("{\"success\":true}\n"));

    // moving to where it already is still succeeds
    env.cmd()
        .args(["leads", "move", &a.to_string(), "2", "0", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("{\"success\":true}\n"));

    env.cmd()
        .args(["leads", "move", "99", "2", "0", "--json"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::diff("{\"error\":\"Lead 99 not found\"}\n"));

    env.cmd()
        .args(["leads", "move", &a.to_string(), "42", "0", "--json"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Stage 42 not found"));
}

#[test]
fn test_negative_position_clamps_to_top() {
    let env = CrmEnv::new();
    env.seed_pipeline();
    let a = env.add_lead("a@example.com", Some("1"));
    let b = env.add_lead("b@example.com", Some("1"));

    env.run(&["leads", "move", &b.to_string(), "1", "-5"]);
    assert_eq!(env.column("1", NEW), vec![(b, 0), (a, 1)]);
}

#[test]
fn test_delete_closes_gap() {
    let env = CrmEnv::new();
    env.seed_pipeline();
    let a = env.add_lead("a@example.com", Some("1"));
    let b = env.add_lead("b@example.com", Some("1"));
    let c = env.add_lead("c@example.com", Some("1"));
    let d = env.add_lead("d@example.com", Some("1"));

    env.run(&["leads", "delete", &b.to_string()]);
    assert_eq!(env.column("1", NEW), vec![(a, 0), (c, 1), (d, 2)]);

    // deleting the contact takes its lead with it
    let lead = env.json(&["leads", "show", &c.to_string(), "--json"]);
    let contact_id = lead["lead"]["contact_id"].as_i64().unwrap().to_string();
    env.run(&["contacts", "delete", &contact_id]);
    assert_eq!(env.column("1", NEW), vec![(a, 0), (d, 1)]);
}

#[test]
fn test_stage_reorder_changes_board_order() {
    let env = CrmEnv::new();
    env.seed_pipeline();

    env.run(&["stages", "reorder", "1", "3,1,2"]);

    let board = env.json(&["pipelines", "show", "1", "--json"]);
    let names: Vec<&str> = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|col| col["stage"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Won", "New", "Qualified"]);

    env.cmd()
        .args(["stages", "reorder", "1", "3,1"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Stage list must contain exactly"));
}

#[test]
fn test_stage_delete_refused_with_leads() {
    let env = CrmEnv::new();
    env.seed_pipeline();
    let a = env.add_lead("a@example.com", Some("2"));

    env.cmd()
        .args(["stages", "delete", "2"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Cannot delete stage with leads"));

    env.run(&["leads", "move", &a.to_string(), "1", "0"]);
    env.run(&["stages", "delete", "2"]);

    let stages = env.json(&["stages", "list", "1", "--json"]);
    let positions: Vec<(i64, i64)> = stages
        .as_array()
        .unwrap()
        .iter()
        .map(|s| (s["id"].as_i64().unwrap(), s["position"].as_i64().unwrap()))
        .collect();
    assert_eq!(positions, vec![(1, 0), (3, 1)]);
}

#[test]
fn test_board_text_output() {
    let env = CrmEnv::new();
    env.seed_pipeline();
    env.run(&["contacts", "add", "ana@example.com", "--name", "Ana", "--company", "Acme"]);
    env.run(&["leads", "add", "1", "--stage", "2", "--value", "1200"]);

    env.cmd()
        .args(["pipelines", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Sales (pipeline 1) ==="))
        .stdout(predicate::str::contains("[2] Qualified (1)"))
        .stdout(predicate::str::contains("Ana"))
        .stdout(predicate::str::contains("1200.00"))
        .stdout(predicate::str::contains("Acme"));
}
