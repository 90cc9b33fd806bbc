// shared utilities for integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

/// assert a process exited with `code`, printing its output otherwise
#[macro_export]
macro_rules! assert_exit {
    ($output:expr, $code:expr) => {
        assert_eq!(
            $output.status.code(),
            Some($code),
            "stdout: {}\nstderr: {}",
            String::from_utf8_lossy(&$output.stdout),
            String::from_utf8_lossy(&$output.stderr)
        );
    };
}

/// path to the built bwm binary
pub fn bwm_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_bwm"))
}

/// isolated config, desktop snapshot and blueprint directory
pub struct Fixture {
    dir: TempDir,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create test directory");
        let fixture = Self { dir };

        fs::create_dir_all(fixture.blueprint_dir()).expect("Failed to create blueprint dir");
        fixture.write_config(&json!({
            "settings": {
                "blueprint_dirs": [fixture.blueprint_dir().to_str().unwrap()]
            }
        }));
        fixture.write_desktop(&two_monitor_desktop());
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.json")
    }

    pub fn desktop_path(&self) -> PathBuf {
        self.path().join("desktop.json")
    }

    pub fn blueprint_dir(&self) -> PathBuf {
        self.path().join("blueprints")
    }

    pub fn write_config(&self, config: &Value) {
        fs::write(
            self.config_path(),
            serde_json::to_string_pretty(config).unwrap(),
        )
        .expect("Failed to write test config");
    }

    pub fn write_desktop(&self, desktop: &Value) {
        fs::write(
            self.desktop_path(),
            serde_json::to_string_pretty(desktop).unwrap(),
        )
        .expect("Failed to write desktop snapshot");
    }

    /// write `<name>.windowblueprint.json` into the blueprint dir
    pub fn write_blueprint(&self, name: &str, blueprint: &Value) -> PathBuf {
        let path = self
            .blueprint_dir()
            .join(format!("{}.windowblueprint.json", name));
        fs::write(&path, serde_json::to_string_pretty(blueprint).unwrap())
            .expect("Failed to write blueprint");
        path
    }

    /// run bwm against this fixture's config and desktop
    pub fn run(&self, args: &[&str]) -> Output {
        let desktop = self.desktop_path();
        let mut full = vec!["--desktop", desktop.to_str().unwrap()];
        full.extend_from_slice(args);
        self.run_without_desktop(&full)
    }

    /// run bwm with no desktop snapshot at all
    pub fn run_without_desktop(&self, args: &[&str]) -> Output {
        let config = self.config_path();
        Command::new(bwm_binary_path())
            .arg("--config")
            .arg(&config)
            .args(args)
            .current_dir(self.path())
            .env_remove("BWM_CONFIG")
            .env_remove("BWM_DESKTOP")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run bwm")
    }

    /// run with --json and parse stdout
    pub fn run_json(&self, args: &[&str]) -> (Output, Value) {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        let value = parse_json(&output);
        (output, value)
    }
}

pub fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}\nstderr: {}",
            e,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// 1920x1080@96 on the left, 2560x1440@144 on the right
pub fn two_monitor_desktop() -> Value {
    json!({
        "taskbarAvailable": true,
        "monitors": [
            {
                "handle": 1,
                "name": "\\\\.\\DISPLAY1",
                "monitorRect": { "left": 0, "top": 0, "right": 1920, "bottom": 1080 },
                "workAreaRect": { "left": 0, "top": 0, "right": 1920, "bottom": 1040 },
                "dpiX": 96,
                "dpiY": 96
            },
            {
                "handle": 2,
                "name": "\\\\.\\DISPLAY2",
                "monitorRect": { "left": 1920, "top": 0, "right": 4480, "bottom": 1440 },
                "workAreaRect": { "left": 1920, "top": 0, "right": 4480, "bottom": 1400 },
                "dpiX": 144,
                "dpiY": 144
            }
        ],
        "windows": [
            {
                "handle": 16,
                "windowRect": { "left": 100, "top": 100, "right": 900, "bottom": 700 },
                "windowTitle": "Untitled - Notepad",
                "windowClass": "Notepad",
                "programPath": "C:\\Windows\\System32\\notepad.exe",
                "taskbarAppId": "Microsoft.Windows.Notepad",
                "taskbarIndex": 0
            },
            {
                "handle": 32,
                "windowRect": { "left": 2000, "top": 100, "right": 2800, "bottom": 700 },
                "windowTitle": "Inbox - Mail",
                "windowClass": "MailWindow",
                "programPath": "C:\\Apps\\mail.exe"
            },
            {
                "handle": 48,
                "windowRect": { "left": 10, "top": 10, "right": 310, "bottom": 410 },
                "windowTitle": "Calculator",
                "windowClass": "CalcFrame",
                "programPath": "C:\\Windows\\System32\\calc.exe"
            }
        ]
    })
}

/// fingerprints of `two_monitor_desktop`
pub fn desk_monitor_match() -> Value {
    json!({
        "Main": { "x": 0, "y": 0, "width": 1920, "height": 1080, "dpiX": 96, "dpiY": 96 },
        "Side": { "x": 1920, "y": 0, "width": 2560, "height": 1440, "dpiX": 144, "dpiY": 144 }
    })
}

/// notepad centred on Main at half size, mail maximized over Side's work area
pub fn desk_blueprint() -> Value {
    json!({
        "name": "Desk",
        "monitorMatch": desk_monitor_match(),
        "rules": [
            {
                "enabled": true,
                "name": "notepad",
                "filters": { "programPath": "notepad\\.exe$" },
                "targetMonitor": "Main",
                "targetRect": {
                    "width": "monitorWidth / 2",
                    "height": "monitorHeight / 2",
                    "center": true
                }
            },
            {
                "enabled": true,
                "name": "mail",
                "filters": { "programPath": "mail\\.exe$" },
                "targetMonitor": "Side",
                "targetRect": {
                    "posX": "1920",
                    "posY": "0",
                    "width": "workAreaWidth",
                    "height": "workAreaHeight"
                },
                "targetState": "Maximized"
            }
        ]
    })
}

/// a blueprint for a single laptop panel that matches nothing here
pub fn laptop_blueprint() -> Value {
    json!({
        "name": "Laptop",
        "monitorMatch": {
            "Panel": { "x": 0, "y": 0, "width": 1366, "height": 768, "dpiX": 96, "dpiY": 96 }
        },
        "rules": []
    })
}
