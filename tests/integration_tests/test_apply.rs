// integration tests for the apply command

use crate::common::*;
use serde_json::json;

fn rect(left: i64, top: i64, right: i64, bottom: i64) -> serde_json::Value {
    json!({ "left": left, "top": top, "right": right, "bottom": bottom })
}

// ============================================================================
// explicit blueprint
// ============================================================================

#[test]
fn test_apply_places_matching_windows() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    let result = &json["result"];
    assert_eq!(result["blueprint"], "Desk");
    assert_eq!(result["dryRun"], false);

    // processed in program file name order: calc, mail, notepad
    let windows = result["windows"].as_array().unwrap();
    assert_eq!(windows.len(), 3);

    assert_eq!(windows[0]["handle"], 48);
    assert_eq!(windows[0]["status"], "no_matching_rule");

    assert_eq!(windows[1]["handle"], 32);
    assert_eq!(windows[1]["status"], "placed");
    assert_eq!(windows[1]["rule"], "mail");
    assert_eq!(windows[1]["monitor"], "Side");
    assert_eq!(windows[1]["rect"], rect(1920, 0, 4480, 1400));
    assert_eq!(windows[1]["state"], "Maximized");

    assert_eq!(windows[2]["handle"], 16);
    assert_eq!(windows[2]["rule"], "notepad");
    assert_eq!(windows[2]["monitor"], "Main");
    assert_eq!(windows[2]["rect"], rect(480, 270, 1440, 810));
    assert_eq!(windows[2]["state"], "Restored");

    let placements = result["placements"].as_array().unwrap();
    assert_eq!(placements.len(), 2);
    assert_eq!(placements[0]["handle"], 32);
    assert_eq!(placements[1]["handle"], 16);
}

#[test]
fn test_apply_text_summary() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let output = fixture.run(&["--no-json", "apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    let out = stdout(&output);
    assert!(out.contains("Applied blueprint 'Desk'"), "{}", out);
    assert!(out.contains("no matching rule"), "{}", out);
    assert!(
        out.contains("Total: 3 windows, 2 placed, 1 unmatched, 0 failed"),
        "{}",
        out
    );
}

#[test]
fn test_apply_logs_progress_to_stderr() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let output = fixture.run(&["--json", "apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    let err = stderr(&output);
    assert!(err.contains("[1/3] processing window"), "{}", err);
    assert!(err.contains("[3/3] processing window"), "{}", err);
}

#[test]
fn test_apply_quiet_prints_nothing() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let output = fixture.run(&["--quiet", "apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_apply_dry_run_does_not_place() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap(), "--dry-run"]);
    assert_exit!(output, 0);

    let result = &json["result"];
    assert_eq!(result["dryRun"], true);
    assert_eq!(result["placements"].as_array().unwrap().len(), 0);
    // outcomes are still computed
    assert_eq!(result["windows"][2]["status"], "placed");
    assert_eq!(result["windows"][2]["rect"], rect(480, 270, 1440, 810));
}

#[test]
fn test_apply_dry_run_from_config() {
    let fixture = Fixture::new();
    fixture.write_config(&json!({
        "settings": {
            "blueprint_dirs": [fixture.blueprint_dir().to_str().unwrap()],
            "dry_run": true
        }
    }));
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);
    assert_eq!(json["result"]["dryRun"], true);
    assert_eq!(json["result"]["placements"].as_array().unwrap().len(), 0);
}

#[test]
fn test_apply_monitor_mismatch_exits_7() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("laptop", &laptop_blueprint());

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 7);
    assert_eq!(json["error"]["code"], -32007);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("'Laptop'"));
    assert!(json["error"]["data"]["details"].as_array().unwrap().len() >= 1);
}

#[test]
fn test_apply_unreadable_blueprint_exits_5() {
    let fixture = Fixture::new();
    let path = fixture.blueprint_dir().join("broken.windowblueprint.json");
    std::fs::write(&path, "{ not json").unwrap();

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 5);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("failed to parse blueprint"));
}

#[test]
fn test_apply_failing_init_script_exits_5() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["engineInitScripts"] = json!(["let half = ;"]);
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 5);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("engine init script #1"));
}

#[test]
fn test_apply_init_script_values_reach_expressions() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["engineInitScripts"] = json!(["let margin = 20;"]);
    blueprint["rules"][0]["targetRect"] = json!({
        "posX": "margin",
        "posY": "margin",
        "width": "monitorWidth - 2 * margin",
        "height": "workAreaHeight - 2 * margin"
    });
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);
    assert_eq!(json["result"]["windows"][2]["rect"], rect(20, 20, 1900, 1020));
}

#[test]
fn test_apply_expression_error_skips_window() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["rules"][0]["targetRect"]["height"] = json!("noSuchVariable * 2");
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    let notepad = &json["result"]["windows"][2];
    assert_eq!(notepad["status"], "skipped");
    assert_eq!(notepad["rule"], "notepad");
    assert_eq!(notepad["reason"]["kind"], "expression");
    assert!(notepad["reason"]["message"]
        .as_str()
        .unwrap()
        .contains("height expression"));

    // the other window is unaffected
    assert_eq!(json["result"]["windows"][1]["status"], "placed");
    assert_eq!(json["result"]["placements"].as_array().unwrap().len(), 1);
}

#[test]
fn test_apply_unusable_centered_width_skips_window() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["rules"][0]["targetRect"]["width"] = json!("-2147483648");
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    let notepad = &json["result"]["windows"][2];
    assert_eq!(notepad["status"], "skipped");
    assert_eq!(notepad["reason"]["kind"], "expression");
    assert!(notepad["reason"]["message"]
        .as_str()
        .unwrap()
        .contains("not a usable coordinate"));
    assert_eq!(json["result"]["windows"][1]["status"], "placed");
}

#[test]
fn test_apply_unknown_target_monitor_suggests_name() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["rules"][0]["targetMonitor"] = json!("Mian");
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    let reason = &json["result"]["windows"][2]["reason"];
    assert_eq!(reason["kind"], "unknown_target_monitor");
    assert!(reason["message"]
        .as_str()
        .unwrap()
        .contains("did you mean 'Main'?"));
}

#[test]
fn test_apply_without_target_monitor_uses_current() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["rules"][1] = json!({
        "enabled": true,
        "name": "mail",
        "filters": { "windowTitle": "Mail$" },
        "targetRect": { "width": "monitorWidth / 4" }
    });
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    // the mail window sits on the right monitor, so its width comes from there
    let mail = &json["result"]["windows"][1];
    assert_eq!(mail["status"], "placed");
    assert_eq!(mail["monitor"], "\\\\.\\DISPLAY2");
    assert_eq!(mail["rect"], rect(2000, 100, 2640, 700));
}

#[test]
fn test_apply_taskbar_rules_ignored_without_taskbar_info() {
    let fixture = Fixture::new();
    let mut desktop = two_monitor_desktop();
    desktop["taskbarAvailable"] = json!(false);
    fixture.write_desktop(&desktop);

    let mut blueprint = desk_blueprint();
    blueprint["rules"][0]["filters"] = json!({ "taskbarAppId": "Notepad" });
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);

    assert_eq!(json["result"]["ignoredRules"], json!(["notepad"]));
    assert_eq!(json["result"]["windows"][2]["status"], "no_matching_rule");
}

#[test]
fn test_apply_program_windows_visible_to_scripts() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint["rules"][0]["targetRect"] = json!({ "width": "programWindows.len() * 100" });
    let path = fixture.write_blueprint("desk", &blueprint);

    let (output, json) = fixture.run_json(&["apply", path.to_str().unwrap()]);
    assert_exit!(output, 0);
    assert_eq!(json["result"]["windows"][2]["rect"], rect(100, 100, 400, 700));
}

#[test]
fn test_apply_without_desktop_fails() {
    let fixture = Fixture::new();
    let path = fixture.write_blueprint("desk", &desk_blueprint());

    let output = fixture.run_without_desktop(&["--json", "apply", path.to_str().unwrap()]);
    assert_exit!(output, 1);
}

// ============================================================================
// discovered blueprints
// ============================================================================

#[test]
fn test_apply_discovers_single_valid_blueprint() {
    let fixture = Fixture::new();
    fixture.write_blueprint("desk", &desk_blueprint());
    fixture.write_blueprint("laptop", &laptop_blueprint());

    let (output, json) = fixture.run_json(&["apply"]);
    assert_exit!(output, 0);
    assert_eq!(json["result"]["blueprint"], "Desk");
}

#[test]
fn test_apply_no_valid_blueprint_exits_8() {
    let fixture = Fixture::new();
    fixture.write_blueprint("laptop", &laptop_blueprint());

    let (output, json) = fixture.run_json(&["apply"]);
    assert_exit!(output, 8);
    assert_eq!(json["error"]["code"], -32008);
}

#[test]
fn test_apply_empty_blueprint_dir_exits_8() {
    let fixture = Fixture::new();

    let (output, _) = fixture.run_json(&["apply"]);
    assert_exit!(output, 8);
}

#[test]
fn test_apply_several_valid_requires_pick() {
    let fixture = Fixture::new();
    fixture.write_blueprint("desk", &desk_blueprint());
    let mut focus = desk_blueprint();
    focus["name"] = json!("Focus");
    fixture.write_blueprint("focus", &focus);

    let (output, json) = fixture.run_json(&["apply"]);
    assert_exit!(output, 4);
    assert_eq!(json["error"]["data"]["suggestions"], json!(["Desk", "Focus"]));
}

#[test]
fn test_apply_pick_by_index_and_name() {
    let fixture = Fixture::new();
    fixture.write_blueprint("desk", &desk_blueprint());
    let mut focus = desk_blueprint();
    focus["name"] = json!("Focus");
    fixture.write_blueprint("focus", &focus);

    let (output, json) = fixture.run_json(&["apply", "--pick", "1"]);
    assert_exit!(output, 0);
    assert_eq!(json["result"]["blueprint"], "Focus");

    let (output, json) = fixture.run_json(&["apply", "--pick", "desk"]);
    assert_exit!(output, 0);
    assert_eq!(json["result"]["blueprint"], "Desk");

    let (output, _) = fixture.run_json(&["apply", "--pick", "7"]);
    assert_exit!(output, 4);
}

#[test]
fn test_apply_unnamed_blueprint_uses_file_stem() {
    let fixture = Fixture::new();
    let mut blueprint = desk_blueprint();
    blueprint.as_object_mut().unwrap().remove("name");
    fixture.write_blueprint("home-office", &blueprint);

    let (output, json) = fixture.run_json(&["apply", "--dry-run"]);
    assert_exit!(output, 0);
    assert_eq!(json["result"]["blueprint"], "home-office");
}
