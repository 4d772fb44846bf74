use assert_cmd::Command;
use blueprint_core::{CommunicationType, RelationType};
use blueprint_ir::{Field, FieldType, ProjectConfig};
use blueprint_state::{EngineConfig, Workspace};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn blueprint(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("blueprint").unwrap();
    cmd.current_dir(dir).env_remove("BLUEPRINT_CONFIG");
    cmd
}

/// A shop project with two services and one relation
fn write_fixture(dir: &Path) -> PathBuf {
    let mut ws = Workspace::with_project(EngineConfig::default(), ProjectConfig::new("Shop"));
    let user = ws.add_entity("User");
    ws.add_field(user, Field::new("email", FieldType::String))
        .unwrap();
    let order = ws.add_entity("Order");
    ws.add_relation(order, user, RelationType::ManyToOne);
    let accounts = ws.add_service("Accounts");
    let billing = ws.add_service("Billing");
    ws.assign_entity_to_service(user, accounts);
    ws.assign_entity_to_service(order, billing);
    ws.add_connection(billing, accounts, CommunicationType::Rest);

    let path = dir.join("shop.json");
    std::fs::write(&path, ws.export_json().unwrap()).unwrap();
    path
}

#[test]
fn test_new_then_validate() {
    let dir = TempDir::new().unwrap();

    blueprint(dir.path())
        .args(["new", "My Shop", "-d", "Online store"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created project 'My Shop'"));

    let file = dir.path().join("my_shop.json");
    assert!(file.exists());

    blueprint(dir.path())
        .args(["validate", "my_shop.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_new_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    blueprint(dir.path()).args(["new", "shop"]).assert().success();

    blueprint(dir.path())
        .args(["new", "shop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    blueprint(dir.path())
        .args(["new", "shop", "--force"])
        .assert()
        .success();
}

#[test]
fn test_validate_lists_every_violation() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("broken.json");
    std::fs::write(
        &file,
        r#"{"project": {"name": "Broken"}, "entities": [{"name": 3}], "relations": "x"}"#,
    )
    .unwrap();

    blueprint(dir.path())
        .args(["validate", "broken.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[relations]"))
        .stdout(predicate::str::contains("[entities[0]"));
}

#[test]
fn test_validate_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

    blueprint(dir.path())
        .args(["validate", "bad.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid JSON"));
}

#[test]
fn test_info_summarizes_project() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    blueprint(dir.path())
        .args(["info", "shop.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shop"))
        .stdout(predicate::str::contains("2 entities"))
        .stdout(predicate::str::contains("Order.user"))
        .stdout(predicate::str::contains("Billing -> Accounts"));
}

#[test]
fn test_info_missing_file() {
    let dir = TempDir::new().unwrap();
    blueprint(dir.path())
        .args(["info", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_layout_writes_output() {
    let dir = TempDir::new().unwrap();
    let file = write_fixture(dir.path());
    let before = std::fs::read_to_string(&file).unwrap();

    blueprint(dir.path())
        .args(["layout", "shop.json", "--density", "spacious", "-o", "laid_out.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Laid out 2 entities in 2 services"));

    assert_eq!(std::fs::read_to_string(&file).unwrap(), before);

    let laid_out = std::fs::read_to_string(dir.path().join("laid_out.json")).unwrap();
    let mut ws = Workspace::default();
    ws.import_json(&laid_out).unwrap();
    let services = ws.services();
    let entities = ws.entities();
    for service in services.all() {
        for id in &service.entity_ids {
            let p = entities.get(*id).unwrap().position;
            assert!(p.x >= service.position.x && p.x < service.position.x + service.width);
            assert!(p.y >= service.position.y && p.y < service.position.y + service.height);
        }
    }
}

#[test]
fn test_canvas_json_in_services_mode() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    let output = blueprint(dir.path())
        .args(["canvas", "shop.json", "--mode", "services", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let graph: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let nodes = graph["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[0]["kind"], "service");
    assert!(nodes[2]["parentId"].is_string());
    assert_eq!(graph["edges"][0]["label"], "rest");
}

#[test]
fn test_canvas_filter_by_service_name() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());

    blueprint(dir.path())
        .args(["canvas", "shop.json", "--filter", "Billing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Order"))
        .stdout(predicate::str::contains("User").not());

    blueprint(dir.path())
        .args(["canvas", "shop.json", "--filter", "Shipping"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no service named 'Shipping'"));
}

#[test]
fn test_bad_config_is_reported() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    std::fs::write(dir.path().join("blueprint.toml"), "[history]\nmax_entries = 0\n").unwrap();

    blueprint(dir.path())
        .args(["info", "shop.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load engine config"));
}
