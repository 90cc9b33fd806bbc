mod schema;

pub use schema::{
    Blueprint, FilterField, LayoutRule, MonitorMatcher, RectField, WindowFilters, WindowRect,
    WindowState,
};

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::apply::suggest_names;
use crate::desktop::Desktop;
use crate::display::{validate_monitor_match, LiveMonitor, MonitorMatchIssue};
use crate::script::ScriptContext;

/// file name suffix of blueprint files
pub const BLUEPRINT_EXTENSION: &str = ".windowblueprint.json";

pub fn load(path: &Path) -> Result<Blueprint> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read blueprint: {}", path.display()))?;

    let mut blueprint = parse(&content)
        .with_context(|| format!("failed to parse blueprint: {}", path.display()))?;

    if blueprint.name.is_empty() {
        blueprint.name = file_stem(path);
    }

    debug!(
        name = %blueprint.name,
        rules = blueprint.rules.len(),
        path = %path.display(),
        "loaded blueprint"
    );
    Ok(blueprint)
}

/// parse blueprint JSON and check the structural invariants
pub fn parse(content: &str) -> Result<Blueprint> {
    let blueprint: Blueprint = serde_json::from_str(content)?;
    if blueprint.monitor_match.is_empty() {
        return Err(anyhow!("monitorMatch must declare at least one monitor"));
    }
    Ok(blueprint)
}

fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_suffix(BLUEPRINT_EXTENSION)
        .map(str::to_string)
        .unwrap_or(name)
}

/// all blueprint files in `dirs`, sorted by path; missing dirs are skipped
pub fn discover(dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for dir in dirs {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "blueprint directory not found, skipping");
            continue;
        }

        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to read directory: {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let is_blueprint = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(BLUEPRINT_EXTENSION));
            if is_blueprint && path.is_file() {
                found.push(path);
            }
        }
    }

    found.sort();
    found.dedup();
    Ok(found)
}

/// a blueprint file, loaded, with the outcome of the pre-flight monitor check
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub blueprint: Blueprint,
    pub issues: Vec<MonitorMatchIssue>,
}

impl Candidate {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// load every path and run the monitor check against `monitors`
///
/// unreadable files are logged and left out.
pub fn preflight(paths: &[PathBuf], monitors: &[LiveMonitor]) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for path in paths {
        let blueprint = match load(path) {
            Ok(b) => b,
            Err(e) => {
                warn!("skipping {}: {:#}", path.display(), e);
                continue;
            }
        };

        let issues = validate_monitor_match(&blueprint, monitors).issues;
        if issues.is_empty() {
            info!(
                "loaded blueprint '{}' ({} rules, {})",
                blueprint.name,
                blueprint.rules.len(),
                path.display()
            );
        } else {
            warn!(
                "blueprint '{}' does not match the monitors: {}",
                blueprint.name,
                issues
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }

        candidates.push(Candidate {
            path: path.clone(),
            blueprint,
            issues,
        });
    }

    candidates
}

/// pick one of `valid` by 0-based index or by blueprint name
pub fn pick<'a>(valid: &'a [Candidate], choice: &str) -> Result<&'a Candidate> {
    let choice = choice.trim();

    if let Ok(index) = choice.parse::<usize>() {
        return valid.get(index).ok_or_else(|| {
            anyhow!(
                "invalid selection {}: {} blueprints available",
                index,
                valid.len()
            )
        });
    }

    valid
        .iter()
        .find(|c| c.blueprint.name == choice)
        .or_else(|| {
            valid
                .iter()
                .find(|c| c.blueprint.name.eq_ignore_ascii_case(choice))
        })
        .ok_or_else(|| anyhow!("no valid blueprint named '{}'", choice))
}

/// list `valid` on stderr and read the choice from stdin
pub fn prompt<'a>(valid: &'a [Candidate]) -> Result<&'a Candidate> {
    let mut stderr = io::stderr();
    writeln!(stderr, "Blueprints available:")?;
    for (index, candidate) in valid.iter().enumerate() {
        writeln!(stderr, "  {}: {}", index, candidate.blueprint.name)?;
    }
    write!(stderr, "Which would you like to apply? ")?;
    stderr.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    pick(valid, &input)
}

/// read and check a blueprint file, returning one message per problem
///
/// unreadable or malformed JSON is an `Err`; everything else is a diagnostic.
pub fn verify(
    path: &Path,
    desktop: Option<&dyn Desktop>,
    fuzzy_threshold: usize,
) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(anyhow!("blueprint file not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read blueprint: {}", path.display()))?;
    let blueprint: Blueprint =
        serde_json::from_str(&content).map_err(|e| anyhow!("invalid JSON: {}", e))?;

    Ok(diagnose(&blueprint, desktop, fuzzy_threshold))
}

/// static checks, plus host checks when a desktop is available
pub fn diagnose(
    blueprint: &Blueprint,
    desktop: Option<&dyn Desktop>,
    fuzzy_threshold: usize,
) -> Vec<String> {
    let mut errors = Vec::new();

    if blueprint.monitor_match.is_empty() {
        errors.push("monitorMatch: must declare at least one monitor".to_string());
    }

    for (i, source) in blueprint.engine_init_scripts.iter().enumerate() {
        let what = format!("engineInitScripts[{}]", i);
        if let Err(e) = ScriptContext::check_compiles(&what, source) {
            errors.push(e.to_string());
        }
    }

    for (i, rule) in blueprint.rules.iter().enumerate() {
        let prefix = if rule.name.is_empty() {
            format!("rules[{}]", i)
        } else {
            format!("rules[{}] '{}'", i, rule.name)
        };

        if let Some(target) = &rule.target_monitor {
            if !blueprint.monitor_match.contains_key(target) {
                let close = suggest_names(
                    target,
                    blueprint.monitor_match.keys().map(String::as_str),
                    fuzzy_threshold,
                );
                let hint = if close.is_empty() {
                    String::new()
                } else {
                    format!(" (did you mean '{}'?)", close.join("', '"))
                };
                errors.push(format!(
                    "{}: targetMonitor '{}' is not declared in monitorMatch{}",
                    prefix, target, hint
                ));
            }
        }

        for (field, pattern) in rule.filters.patterns() {
            if let Err(e) = Regex::new(pattern) {
                errors.push(format!(
                    "{}: invalid {} pattern '{}': {}",
                    prefix, field, pattern, e
                ));
            }
        }

        for (field, expr) in rule.target_rect.expressions() {
            let what = format!("{}: {} expression", prefix, field);
            if let Err(e) = ScriptContext::check_compiles(&what, expr) {
                errors.push(e.to_string());
            }
        }

        if let Some(desktop) = desktop {
            if rule.enabled && rule.filters.uses_taskbar() && !desktop.taskbar_available() {
                errors.push(format!(
                    "{}: uses taskbar filters, which never match on this host",
                    prefix
                ));
            }
        }
    }

    if let Some(desktop) = desktop {
        for issue in validate_monitor_match(blueprint, &desktop.monitors()).issues {
            if issue != MonitorMatchIssue::Empty {
                errors.push(format!("monitorMatch: {}", issue));
            }
        }
    }

    errors
}
