// integration tests for the verify command

use crate::common::*;
use serde_json::json;

#[test]
fn test_verify_valid_blueprint() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let (output, json) = fixture.run_json(&["verify", path.to_str().unwrap()]);
    assert_exit!(output, 0);
    assert_eq!(json["result"]["valid"], true);
    assert_eq!(json["result"]["hostChecked"], true);
    assert_eq!(json["result"]["errors"], json!([]));
}

#[test]
fn test_verify_valid_text_output() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let output = fixture.run(&["--no-json", "verify", path.to_str().unwrap()]);
    assert_exit!(output, 0);
    assert!(stdout(&output).contains("✓ Blueprint is valid"));
}

#[test]
fn test_verify_reports_every_problem() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["engineInitScripts"] = json!(["fn broken( {"]);
    blueprint["rules"][0]["targetMonitor"] = json!("Mian");
    blueprint["rules"][0]["filters"]["windowTitle"] = json!("([unclosed");
    blueprint["rules"][1]["targetRect"]["width"] = json!("workAreaWidth +");
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["verify", path.to_str().unwrap()]);
    assert_exit!(output, 5);

    let errors: Vec<String> = json["result"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap().to_string())
        .collect();
    assert_eq!(errors.len(), 4, "{:?}", errors);
    assert!(errors.iter().any(|e| e.contains("engineInitScripts[0]")));
    assert!(errors
        .iter()
        .any(|e| e.contains("targetMonitor 'Mian'") && e.contains("did you mean 'Main'?")));
    assert!(errors.iter().any(|e| e.contains("invalid windowTitle pattern")));
    assert!(errors.iter().any(|e| e.contains("width expression")));
}

#[test]
fn test_verify_text_lists_errors() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["rules"][0]["filters"]["windowClass"] = json!("*bad");
    let path = fixture.write_blueprint("desk", &blueprint);

    let output = fixture.run(&["--no-json", "verify", path.to_str().unwrap()]);
    assert_exit!(output, 5);

    let out = stdout(&output);
    assert!(out.contains("✗ Blueprint has 1 error(s)"), "{}", out);
    assert!(out.contains("invalid windowClass pattern"), "{}", out);
}

#[test]
fn test_verify_host_checks_monitors() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("laptop", &laptop_blueprint());

    let (output, json) = fixture.run_json(&["verify", path.to_str().unwrap()]);
    assert_exit!(output, 5);
    let errors = json["result"]["errors"].as_array().unwrap();
    assert!(errors
        .iter()
        .all(|e| e.as_str().unwrap().starts_with("monitorMatch:")));
}

#[test]
fn test_verify_without_desktop_skips_host_checks() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("laptop", &laptop_blueprint());

    let output = fixture.run_without_desktop(&["--json", "verify", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    let json = parse_json(&output);
    assert_eq!(json["result"]["valid"], true);
    assert_eq!(json["result"]["hostChecked"], false);
}

#[test]
fn test_verify_taskbar_rules_on_host_without_taskbar() {
    let fixture = Fixture::new();
    let mut desktop = two_monitor_desktop();
    desktop["taskbarAvailable"] = json!(false);
    fixture.write_desktop(&desktop);

    let mut blueprint = desk_blueprint();
    blueprint["rules"][0]["filters"] = json!({ "taskbarIndex": 0 });
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["verify", path.to_str().unwrap()]);
    assert_exit!(output, 5);
    assert!(json["result"]["errors"][0]
        .as_str()
        .unwrap()
        .contains("uses taskbar filters"));
}

#[test]
fn test_verify_invalid_json_exits_5() {
    let fixture = Fixture::new();
    let path = fixture.blueprint_dir().join("broken.windowblueprint.json");
    std::fs::write(&path, "{ \"monitorMatch\": ").unwrap();

    let (output, json) = fixture.run_json(&["verify", path.to_str().unwrap()]);
    assert_exit!(output, 5);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("invalid JSON"));
}

#[test]
fn test_verify_missing_file_exits_5() {
    let fixture = Fixture::new();
    let path = fixture.path().join("nope.windowblueprint.json");

    let (output, json) = fixture.run_json(&["verify", path.to_str().unwrap()]);
    assert_exit!(output, 5);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("not found"));
}
