//! blueprint application: monitor re-check, init scripts, then one pass
//! over every window in program file name order

pub mod geometry;
mod report;

pub use geometry::{compute_target, Target};
pub use report::{ApplyError, ApplyReport, SkipReason, WindowOutcome, WindowReport};

use strsim::levenshtein;
use tracing::{debug, error, info, warn};

use crate::blueprint::{Blueprint, LayoutRule};
use crate::desktop::{Placement, WindowPlacer};
use crate::display::{find_by_handle, validate_monitor_match, LiveMonitor, MonitorMapping};
use crate::script::ScriptContext;
use crate::window::matching::{select_rule, taskbar_dependent_rules, RegexCache};
use crate::window::{sort_for_processing, ProgramWindow};

#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// compute and report placements without moving anything
    pub dry_run: bool,
    pub taskbar_available: bool,
    /// max edit distance for target monitor name suggestions
    pub fuzzy_threshold: usize,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            taskbar_available: true,
            fuzzy_threshold: 2,
        }
    }
}

/// apply `blueprint` to `windows`, forwarding placements to `placer`
///
/// only a monitor mismatch or a failing init script aborts; every window
/// gets an entry in the report.
pub fn apply<P: WindowPlacer + ?Sized>(
    blueprint: &Blueprint,
    monitors: &[LiveMonitor],
    windows: &[ProgramWindow],
    placer: &mut P,
    options: ApplyOptions,
) -> Result<ApplyReport, ApplyError> {
    let mapping = validate_monitor_match(blueprint, monitors)
        .into_mapping()
        .map_err(|issues| {
            for issue in &issues {
                error!("{}", issue);
            }
            ApplyError::MonitorMatch(issues)
        })?;

    let mut ctx = ScriptContext::new(windows).map_err(ApplyError::ProgramWindows)?;
    for (index, source) in blueprint.engine_init_scripts.iter().enumerate() {
        ctx.run_init_script(index, source).map_err(|e| {
            error!("{}", e);
            ApplyError::InitScript(e)
        })?;
    }

    let ignored_rules = if options.taskbar_available {
        Vec::new()
    } else {
        taskbar_dependent_rules(&blueprint.rules)
    };
    for name in &ignored_rules {
        warn!(rule = %name, "taskbar info unavailable, rule ignored");
    }

    let mut run = Run {
        blueprint,
        monitors,
        mapping: &mapping,
        ctx: &mut ctx,
        cache: RegexCache::new(),
        placer,
        options,
    };

    let ordered = sort_for_processing(windows);
    let total = ordered.len();
    let mut reports = Vec::with_capacity(total);

    for (i, window) in ordered.into_iter().enumerate() {
        info!("[{}/{}] processing window {}", i + 1, total, window.describe());
        debug!(
            class = %window.class,
            program = window.program_path.as_deref().unwrap_or(""),
            taskbar_app_id = window.taskbar_app_id.as_deref().unwrap_or(""),
            taskbar_index = ?window.taskbar_index,
            taskbar_sub_index = ?window.taskbar_sub_index,
            tool_window = window.is_tool_window,
            "window attributes"
        );

        let outcome = run.process(window);
        log_outcome(&outcome);
        reports.push(WindowReport::new(window, outcome));
    }

    Ok(ApplyReport {
        blueprint: blueprint.name.clone(),
        dry_run: options.dry_run,
        ignored_rules,
        windows: reports,
    })
}

struct Run<'a, P: WindowPlacer + ?Sized> {
    blueprint: &'a Blueprint,
    monitors: &'a [LiveMonitor],
    mapping: &'a MonitorMapping,
    ctx: &'a mut ScriptContext,
    cache: RegexCache,
    placer: &'a mut P,
    options: ApplyOptions,
}

impl<'a, P: WindowPlacer + ?Sized> Run<'a, P> {
    fn process(&mut self, window: &ProgramWindow) -> WindowOutcome {
        let blueprint = self.blueprint;
        let selected = match select_rule(
            window,
            &blueprint.rules,
            self.options.taskbar_available,
            &mut self.cache,
        ) {
            Ok(Some(selected)) => selected,
            Ok(None) => return WindowOutcome::NoMatchingRule,
            Err(e) => {
                return WindowOutcome::FilterError {
                    rule: e.rule.clone(),
                    message: e.to_string(),
                }
            }
        };
        let rule = selected.rule;
        debug!(rule = %rule.name, index = selected.index, "selected rule");

        let skipped = |reason| WindowOutcome::Skipped {
            rule: rule.name.clone(),
            reason,
        };

        let (monitor_name, monitor) = match self.target_monitor(window, rule) {
            Ok(found) => found,
            Err(reason) => return skipped(reason),
        };
        let Some(current) = self.placer.current_rect(window) else {
            return skipped(SkipReason::CurrentRectUnavailable);
        };

        let target = match compute_target(self.ctx, current, rule, monitor) {
            Ok(target) => target,
            Err(e) => return skipped(SkipReason::Expression(e)),
        };
        debug!(from = %current.describe(), to = %target.rect.describe(), "target rect");

        let placement = Placement {
            handle: window.handle,
            rect: target.rect,
            state: target.state,
        };
        if !self.options.dry_run {
            self.placer.place_window(&placement);
        }

        WindowOutcome::Placed {
            rule: rule.name.clone(),
            monitor: monitor_name,
            rect: target.rect,
            state: target.state,
        }
    }

    /// the rule's named monitor, or the one the window is on now
    fn target_monitor(
        &self,
        window: &ProgramWindow,
        rule: &LayoutRule,
    ) -> Result<(String, &'a LiveMonitor), SkipReason> {
        let mapping = self.mapping;
        let monitors = self.monitors;
        if let Some(name) = &rule.target_monitor {
            return match mapping.get(name) {
                Some(monitor) => Ok((name.clone(), monitor)),
                None => Err(SkipReason::UnknownTargetMonitor {
                    name: name.clone(),
                    suggestions: suggest_names(name, mapping.names(), self.options.fuzzy_threshold),
                }),
            };
        }

        let handle = self.placer.current_monitor(window, monitors);
        handle
            .and_then(|h| find_by_handle(h, monitors))
            .map(|m| (m.name.clone(), m))
            .ok_or(SkipReason::CurrentMonitorNotFound { handle })
    }
}

/// `candidates` within `threshold` edits of `name`, nearest first
pub fn suggest_names<'n>(
    name: &str,
    candidates: impl Iterator<Item = &'n str>,
    threshold: usize,
) -> Vec<String> {
    let query = name.to_lowercase();
    let mut scored: Vec<(usize, &str)> = candidates
        .map(|candidate| (levenshtein(&query, &candidate.to_lowercase()), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .collect();
    scored.sort();
    scored.into_iter().map(|(_, n)| n.to_string()).collect()
}

fn log_outcome(outcome: &WindowOutcome) {
    match outcome {
        WindowOutcome::Placed {
            rule, monitor, rect, state,
        } => info!(
            "placed by rule '{}' on '{}' at {} ({})",
            rule,
            monitor,
            rect.describe(),
            state
        ),
        WindowOutcome::NoMatchingRule => info!("no matching rule"),
        WindowOutcome::FilterError { message, .. } => warn!("{}", message),
        WindowOutcome::Skipped { rule, reason } => {
            warn!("rule '{}' matched but window skipped: {}", rule, reason)
        }
    }
}
