use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::apply::{self, ApplyError, ApplyOptions, ApplyReport, WindowOutcome};
use crate::blueprint::{self, Candidate};
use crate::config::{self, Config};
use crate::desktop::{self, Desktop, Placement};
use crate::display::{validate_monitor_match, LiveMonitor, MonitorMatchIssue};
use crate::geom::Rect;
use crate::logging::{self, LogArgs};
use crate::window::ProgramWindow;

use super::exit_codes;
use super::output::{self, OutputMode};

#[derive(Parser)]
#[command(name = "bwm")]
#[command(about = "Apply declarative window layouts across multiple monitors")]
#[command(version)]
pub struct Cli {
    /// Path to config file (overrides BWM_CONFIG env var and default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Desktop snapshot to use instead of the live desktop (overrides BWM_DESKTOP)
    #[arg(long, global = true)]
    pub desktop: Option<String>,

    /// Output in JSON format (auto-enabled when stdout is piped)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Force text output even when stdout is piped
    #[arg(long, global = true, conflicts_with = "json")]
    pub no_json: bool,

    /// Suppress all output on success (errors still go to stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a blueprint to all visible windows
    Apply {
        /// Blueprint file; discovered from the configured directories if omitted
        blueprint: Option<PathBuf>,

        /// Compute and report placements without moving any window
        #[arg(long)]
        dry_run: bool,

        /// Choose among several matching blueprints by index (0-based) or name
        #[arg(long)]
        pick: Option<String>,
    },

    /// Check which blueprints match the connected monitors
    Check {
        /// Blueprint file; all discovered blueprints if omitted
        blueprint: Option<PathBuf>,
    },

    /// Verify a blueprint file for errors
    Verify {
        /// Blueprint file to verify
        blueprint: PathBuf,
    },

    /// List monitors, windows or blueprints
    List {
        /// Resource type to list (shows available resources if omitted)
        #[arg(value_enum)]
        resource: Option<ListResource>,

        /// Output in JSON format (overrides global --json for this command)
        #[arg(long)]
        json: bool,

        /// Output one name per line (ideal for piping to fzf/xargs)
        #[arg(long, conflicts_with = "json")]
        names: bool,

        /// Custom output format using {field} placeholders (e.g., "{name} {width}x{height}")
        #[arg(long, conflicts_with_all = ["json", "names"])]
        format: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show config file path
    Path,
    /// Set a configuration value
    Set {
        /// Key to set (e.g., settings.dry_run)
        key: String,
        /// Value to set
        value: String,
    },
    /// Reset configuration to defaults
    Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListResource {
    /// Connected monitors
    Monitors,
    /// Visible top-level windows
    Windows,
    /// Blueprint files in the configured directories
    Blueprints,
}

// JSON output structs

#[derive(Serialize)]
struct ListResponse<T: Serialize> {
    items: Vec<T>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyData<'a> {
    path: String,
    #[serde(flatten)]
    report: &'a ApplyReport,
    /// placements the desktop actually received
    placements: &'a [Placement],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckItem {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    valid: bool,
    /// logical name -> live monitor name, null when unmatched
    monitors: BTreeMap<String, Option<String>>,
    issues: Vec<MonitorMatchIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyData {
    path: String,
    valid: bool,
    /// false when no desktop was available for host checks
    host_checked: bool,
    errors: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonitorItem {
    handle: String,
    name: String,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    dpi_x: u32,
    dpi_y: u32,
    work_area: Rect,
}

impl From<&LiveMonitor> for MonitorItem {
    fn from(m: &LiveMonitor) -> Self {
        Self {
            handle: m.handle.to_string(),
            name: m.name.clone(),
            x: m.monitor_rect.left,
            y: m.monitor_rect.top,
            width: m.monitor_rect.width(),
            height: m.monitor_rect.height(),
            dpi_x: m.dpi_x,
            dpi_y: m.dpi_y,
            work_area: m.work_area_rect,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowItem<'a> {
    program: &'a str,
    #[serde(flatten)]
    window: &'a ProgramWindow,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlueprintItem {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    rules: usize,
    monitors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// report an error in the current output mode and exit with `code`
fn fail(
    mode: OutputMode,
    code: i32,
    message: &str,
    suggestions: Vec<String>,
    details: Vec<String>,
) -> ! {
    if mode.is_json() {
        output::print_json_error(code, message, suggestions, details);
    } else {
        eprintln!("Error: {}", message);
        for detail in &details {
            eprintln!("  - {}", detail);
        }
        if !suggestions.is_empty() {
            eprintln!("  Did you mean: {}?", suggestions.join(", "));
        }
    }
    std::process::exit(code);
}

/// state shared by the commands that read blueprints or the desktop
struct Session {
    config: Config,
    desktop: Option<String>,
    mode: OutputMode,
}

impl Session {
    fn new(loaded: Result<Config>, desktop: Option<String>, mode: OutputMode) -> Self {
        let config = match loaded {
            Ok(config) => config,
            Err(e) => fail(
                mode,
                exit_codes::CONFIG_ERROR,
                &format!("{:#}", e),
                vec![],
                vec![],
            ),
        };
        Self {
            config,
            desktop,
            mode,
        }
    }

    fn open_desktop(&self) -> Box<dyn Desktop> {
        match desktop::open(self.desktop.as_deref()) {
            Ok(desktop) => desktop,
            Err(e) => fail(
                self.mode,
                exit_codes::ERROR,
                &format!("{:#}", e),
                vec![],
                vec![],
            ),
        }
    }

    /// blueprint files in the configured directories
    fn discover(&self) -> Vec<PathBuf> {
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let dirs = config::blueprint_dirs(&self.config, &base);
        match blueprint::discover(&dirs) {
            Ok(paths) => paths,
            Err(e) => fail(
                self.mode,
                exit_codes::ERROR,
                &format!("{:#}", e),
                vec![],
                vec![],
            ),
        }
    }
}

pub fn execute(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        desktop,
        json,
        no_json,
        quiet,
        log,
        command,
    } = cli;
    let output_mode = OutputMode::from_flags(json, no_json, quiet, false, false);

    let loaded = config::load_with_override(config_path.as_deref());
    let config_level = loaded
        .as_ref()
        .ok()
        .and_then(|c| c.settings.log_level.clone());
    logging::init(&logging::compute_spec(&log, config_level.as_deref()));

    match command {
        Commands::Apply {
            blueprint,
            dry_run,
            pick,
        } => {
            let session = Session::new(loaded, desktop, output_mode);
            run_apply(&session, blueprint.as_deref(), dry_run, pick.as_deref())
        }

        Commands::Check { blueprint } => {
            let session = Session::new(loaded, desktop, output_mode);
            run_check(&session, blueprint.as_deref())
        }

        Commands::Verify { blueprint } => {
            let session = Session::new(loaded, desktop, output_mode);
            run_verify(&session, &blueprint)
        }

        Commands::List {
            resource,
            json: list_json,
            names,
            format,
        } => {
            let Some(resource) = resource else {
                println!("Available resources:");
                println!("  monitors    Connected monitors");
                println!("  windows     Visible top-level windows");
                println!("  blueprints  Blueprint files in the configured directories");
                println!();
                println!("Usage: bwm list <RESOURCE> [OPTIONS]");
                println!();
                println!("Examples:");
                println!("  bwm list monitors --desktop desktop.json");
                println!("  bwm list windows --names");
                println!("  bwm list monitors --format '{{name}}: {{width}}x{{height}}'");
                return Ok(());
            };

            // list has its own json flag
            let list_mode =
                OutputMode::from_flags(list_json || json, no_json, quiet, names, format.is_some());
            let session = Session::new(loaded, desktop, list_mode);
            run_list(&session, resource, format.as_deref())
        }

        Commands::Config { command } => run_config(command, config_path.as_deref()),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "bwm", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn run_apply(
    session: &Session,
    explicit: Option<&Path>,
    dry_run: bool,
    pick: Option<&str>,
) -> Result<()> {
    let mut desktop = session.open_desktop();
    let monitors = desktop.monitors();
    for monitor in &monitors {
        info!("found monitor {}", monitor.describe());
    }

    let chosen = select_blueprint(session, explicit, pick, &monitors);

    let windows = desktop.windows();
    info!("found {} windows", windows.len());

    let options = ApplyOptions {
        dry_run: dry_run || session.config.settings.dry_run,
        taskbar_available: desktop.taskbar_available(),
        fuzzy_threshold: session.config.settings.fuzzy_threshold,
    };

    let report = match apply::apply(
        &chosen.blueprint,
        &monitors,
        &windows,
        desktop.as_mut(),
        options,
    ) {
        Ok(report) => report,
        Err(e) => {
            let (code, details) = match &e {
                ApplyError::MonitorMatch(issues) => (
                    exit_codes::MONITOR_MISMATCH,
                    issues.iter().map(ToString::to_string).collect(),
                ),
                ApplyError::InitScript(_) => (exit_codes::CONFIG_ERROR, vec![]),
                ApplyError::ProgramWindows(_) => (exit_codes::ERROR, vec![]),
            };
            fail(session.mode, code, &e.to_string(), vec![], details)
        }
    };

    match session.mode {
        OutputMode::Json => output::print_json(&ApplyData {
            path: chosen.path.display().to_string(),
            report: &report,
            placements: desktop.placements(),
        }),
        OutputMode::Quiet => {}
        _ => print_report(&report, &chosen.path),
    }

    Ok(())
}

/// the explicit blueprint, or the one valid discovered blueprint
fn select_blueprint(
    session: &Session,
    explicit: Option<&Path>,
    pick: Option<&str>,
    monitors: &[LiveMonitor],
) -> Candidate {
    let mode = session.mode;

    if let Some(path) = explicit {
        let blueprint = match blueprint::load(path) {
            Ok(b) => b,
            Err(e) => fail(
                mode,
                exit_codes::CONFIG_ERROR,
                &format!("{:#}", e),
                vec![],
                vec![],
            ),
        };
        let issues = validate_monitor_match(&blueprint, monitors).issues;
        if !issues.is_empty() {
            fail(
                mode,
                exit_codes::MONITOR_MISMATCH,
                &format!(
                    "blueprint '{}' does not match the connected monitors",
                    blueprint.name
                ),
                vec![],
                issues.iter().map(ToString::to_string).collect(),
            );
        }
        return Candidate {
            path: path.to_path_buf(),
            blueprint,
            issues,
        };
    }

    let paths = session.discover();
    let candidates = blueprint::preflight(&paths, monitors);
    let rejected: Vec<String> = candidates
        .iter()
        .filter(|c| !c.is_valid())
        .map(|c| format!("{}: monitor match failed", c.path.display()))
        .collect();
    let mut valid: Vec<Candidate> = candidates.into_iter().filter(Candidate::is_valid).collect();
    let names: Vec<String> = valid.iter().map(|c| c.blueprint.name.clone()).collect();

    if valid.is_empty() {
        fail(
            mode,
            exit_codes::NO_VALID_BLUEPRINT,
            &format!(
                "no valid blueprint for the connected monitors ({} found)",
                paths.len()
            ),
            vec![],
            rejected,
        );
    }

    if let Some(choice) = pick {
        return match blueprint::pick(&valid, choice) {
            Ok(candidate) => candidate.clone(),
            Err(e) => fail(mode, exit_codes::INVALID_ARGS, &e.to_string(), names, vec![]),
        };
    }

    if valid.len() == 1 {
        return valid.remove(0);
    }

    if !mode.is_json() && std::io::stdin().is_terminal() {
        return match blueprint::prompt(&valid) {
            Ok(candidate) => candidate.clone(),
            Err(e) => fail(mode, exit_codes::INVALID_ARGS, &e.to_string(), names, vec![]),
        };
    }

    fail(
        mode,
        exit_codes::INVALID_ARGS,
        &format!(
            "{} blueprints match the connected monitors, choose one with --pick",
            valid.len()
        ),
        names,
        vec![],
    )
}

fn print_report(report: &ApplyReport, path: &Path) {
    let verb = if report.dry_run {
        "Dry run of"
    } else {
        "Applied"
    };
    println!("{} blueprint '{}' ({})", verb, report.blueprint, path.display());

    for name in &report.ignored_rules {
        println!("  ! rule '{}' ignored: taskbar info unavailable", name);
    }

    for window in &report.windows {
        let result = match &window.outcome {
            WindowOutcome::Placed {
                rule,
                monitor,
                rect,
                state,
            } => format!(
                "{} {} on '{}' (rule '{}')",
                rect.describe(),
                state,
                monitor,
                rule
            ),
            WindowOutcome::NoMatchingRule => "no matching rule".to_string(),
            WindowOutcome::FilterError { message, .. } => format!("filter error: {}", message),
            WindowOutcome::Skipped { rule, reason } => {
                format!("skipped (rule '{}'): {}", rule, reason)
            }
        };
        println!("  {} {}: {}", window.handle, window.title, result);
    }

    println!(
        "\nTotal: {} windows, {} placed, {} unmatched, {} failed",
        report.windows.len(),
        report.placed(),
        report.unmatched(),
        report.failed()
    );
}

fn run_check(session: &Session, explicit: Option<&Path>) -> Result<()> {
    let desktop = session.open_desktop();
    let monitors = desktop.monitors();

    let paths = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => session.discover(),
    };

    let mut items = Vec::new();
    for path in &paths {
        let blueprint = match blueprint::load(path) {
            Ok(b) => b,
            Err(e) if explicit.is_some() => fail(
                session.mode,
                exit_codes::CONFIG_ERROR,
                &format!("{:#}", e),
                vec![],
                vec![],
            ),
            Err(e) => {
                items.push(CheckItem {
                    path: path.display().to_string(),
                    name: None,
                    valid: false,
                    monitors: BTreeMap::new(),
                    issues: vec![],
                    error: Some(format!("{:#}", e)),
                });
                continue;
            }
        };

        let result = validate_monitor_match(&blueprint, &monitors);
        items.push(CheckItem {
            path: path.display().to_string(),
            name: Some(blueprint.name.clone()),
            valid: result.is_valid(),
            monitors: result
                .entries
                .iter()
                .map(|(name, live)| (name.clone(), live.as_ref().map(|m| m.name.clone())))
                .collect(),
            issues: result.issues,
            error: None,
        });
    }

    let any_valid = items.iter().any(|i| i.valid);

    match session.mode {
        OutputMode::Json => output::print_json(&ListResponse { items }),
        OutputMode::Quiet => {}
        _ => {
            for item in &items {
                let mark = if item.valid { "✓" } else { "✗" };
                let name = item.name.as_deref().unwrap_or("<unreadable>");
                println!("{} {} ({})", mark, name, item.path);
                for (logical, live) in &item.monitors {
                    println!(
                        "    {} -> {}",
                        logical,
                        live.as_deref().unwrap_or("(no match)")
                    );
                }
                for issue in &item.issues {
                    println!("    - {}", issue);
                }
                if let Some(error) = &item.error {
                    println!("    - {}", error);
                }
            }
            if items.is_empty() {
                println!("No blueprints found.");
            }
        }
    }

    if !any_valid {
        let code = if explicit.is_some() {
            exit_codes::MONITOR_MISMATCH
        } else {
            exit_codes::NO_VALID_BLUEPRINT
        };
        std::process::exit(code);
    }

    Ok(())
}

fn run_verify(session: &Session, path: &Path) -> Result<()> {
    // host checks only when a desktop is reachable
    let desktop = match desktop::open(session.desktop.as_deref()) {
        Ok(desktop) => Some(desktop),
        Err(e) => {
            debug!("verifying without host checks: {:#}", e);
            None
        }
    };

    let errors = match blueprint::verify(
        path,
        desktop.as_deref(),
        session.config.settings.fuzzy_threshold,
    ) {
        Ok(errors) => errors,
        Err(e) => fail(
            session.mode,
            exit_codes::CONFIG_ERROR,
            &format!("{:#}", e),
            vec![],
            vec![],
        ),
    };

    match session.mode {
        OutputMode::Json => output::print_json(&VerifyData {
            path: path.display().to_string(),
            valid: errors.is_empty(),
            host_checked: desktop.is_some(),
            errors: errors.clone(),
        }),
        OutputMode::Quiet => {}
        _ => {
            if errors.is_empty() {
                println!("✓ Blueprint is valid: {}", path.display());
            } else {
                println!(
                    "✗ Blueprint has {} error(s): {}",
                    errors.len(),
                    path.display()
                );
                println!();
                for error in &errors {
                    println!("  - {}", error);
                }
            }
        }
    }

    if !errors.is_empty() {
        std::process::exit(exit_codes::CONFIG_ERROR);
    }
    Ok(())
}

fn run_list(session: &Session, resource: ListResource, format: Option<&str>) -> Result<()> {
    match resource {
        ListResource::Monitors => {
            let monitors = session.open_desktop().monitors();
            let items: Vec<MonitorItem> = monitors.iter().map(MonitorItem::from).collect();

            match (session.mode, format) {
                (OutputMode::Names, _) => {
                    for m in &items {
                        println!("{}", m.name);
                    }
                }
                (OutputMode::Format, Some(fmt)) => {
                    for m in &items {
                        println!("{}", output::format_template(fmt, m));
                    }
                }
                (OutputMode::Json, _) => output::print_json(&ListResponse { items }),
                _ => {
                    println!("Monitors:");
                    for m in &monitors {
                        println!("  {} [{}]", m.describe(), m.handle);
                        let fingerprint = serde_json::to_string(&m.fingerprint())
                            .context("Failed to serialize monitor fingerprint")?;
                        println!("    monitorMatch: {}", fingerprint);
                    }
                    println!("\nTotal: {} monitors", monitors.len());
                }
            }
        }

        ListResource::Windows => {
            let windows = session.open_desktop().windows();
            let items: Vec<WindowItem> = windows
                .iter()
                .map(|w| WindowItem {
                    program: w.program_file_name(),
                    window: w,
                })
                .collect();

            match (session.mode, format) {
                (OutputMode::Names, _) => {
                    for w in &windows {
                        println!("{}", w.title);
                    }
                }
                (OutputMode::Format, Some(fmt)) => {
                    for w in &items {
                        println!("{}", output::format_template(fmt, w));
                    }
                }
                (OutputMode::Json, _) => output::print_json(&ListResponse { items }),
                _ => {
                    println!("Windows:");
                    for w in &windows {
                        let program = match w.program_file_name() {
                            "" => "<unknown>",
                            name => name,
                        };
                        println!("  {} {} [{}] {}", w.handle, program, w.class, w.title);
                    }
                    println!("\nTotal: {} windows", windows.len());
                }
            }
        }

        ListResource::Blueprints => {
            let items: Vec<BlueprintItem> = session
                .discover()
                .iter()
                .map(|path| match blueprint::load(path) {
                    Ok(b) => BlueprintItem {
                        path: path.display().to_string(),
                        name: Some(b.name.clone()),
                        rules: b.rules.len(),
                        monitors: b.monitor_match.keys().cloned().collect(),
                        error: None,
                    },
                    Err(e) => BlueprintItem {
                        path: path.display().to_string(),
                        name: None,
                        rules: 0,
                        monitors: vec![],
                        error: Some(format!("{:#}", e)),
                    },
                })
                .collect();

            match (session.mode, format) {
                (OutputMode::Names, _) => {
                    for b in &items {
                        if let Some(name) = &b.name {
                            println!("{}", name);
                        }
                    }
                }
                (OutputMode::Format, Some(fmt)) => {
                    for b in &items {
                        println!("{}", output::format_template(fmt, b));
                    }
                }
                (OutputMode::Json, _) => output::print_json(&ListResponse { items }),
                _ => {
                    println!("Blueprints:");
                    for b in &items {
                        match (&b.name, &b.error) {
                            (Some(name), _) => println!(
                                "  {} ({} rules, monitors: {}) {}",
                                name,
                                b.rules,
                                b.monitors.join(", "),
                                b.path
                            ),
                            (None, Some(error)) => println!("  ✗ {}: {}", b.path, error),
                            (None, None) => println!("  ✗ {}", b.path),
                        }
                    }
                    println!("\nTotal: {} blueprints", items.len());
                }
            }
        }
    }

    Ok(())
}

fn run_config(command: ConfigCommands, config_path: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = config::load_with_override(config_path)?;
            let json =
                serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("{}", json);
        }
        ConfigCommands::Path => {
            let path = config::get_config_path_with_override(config_path)?;
            println!("{}", path.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = config::load_with_override(config_path)?;
            config::set_value(&mut config, &key, &value)?;
            config::save_with_override(&config, config_path)?;
            println!("Set {} = {}", key, value);
        }
        ConfigCommands::Reset => {
            config::save_with_override(&Config::default(), config_path)?;
            println!("Configuration reset to defaults");
        }
    }
    Ok(())
}
