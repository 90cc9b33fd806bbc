//! per-window outcomes of an apply run

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::blueprint::WindowState;
use crate::display::{MonitorHandle, MonitorMatchIssue};
use crate::geom::Rect;
use crate::script::ScriptError;
use crate::window::{ProgramWindow, WindowHandle};

/// failures that abort the whole run
#[derive(Debug, Clone, Error)]
pub enum ApplyError {
    #[error("monitor configuration does not match the blueprint: {}", join_issues(.0))]
    MonitorMatch(Vec<MonitorMatchIssue>),

    #[error("could not expose program windows to scripts: {0}")]
    ProgramWindows(#[source] ScriptError),

    #[error("{0}")]
    InitScript(#[source] ScriptError),
}

fn join_issues(issues: &[MonitorMatchIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// why a window with a matching rule was not placed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no mapped monitor named '{name}'{}", did_you_mean(.suggestions))]
    UnknownTargetMonitor {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("current monitor {} of the window is not among the live monitors", describe_handle(.handle))]
    CurrentMonitorNotFound { handle: Option<MonitorHandle> },

    #[error("current window rect could not be read")]
    CurrentRectUnavailable,

    #[error(transparent)]
    Expression(ScriptError),
}

impl SkipReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTargetMonitor { .. } => "unknown_target_monitor",
            Self::CurrentMonitorNotFound { .. } => "current_monitor_not_found",
            Self::CurrentRectUnavailable => "current_rect_unavailable",
            Self::Expression(_) => "expression",
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SkipReason", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean '{}'?)", suggestions.join("', '"))
    }
}

fn describe_handle(handle: &Option<MonitorHandle>) -> String {
    handle.map_or_else(|| "(none)".to_string(), |h| h.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WindowOutcome {
    Placed {
        rule: String,
        monitor: String,
        rect: Rect,
        state: WindowState,
    },
    NoMatchingRule,
    /// an invalid filter pattern stopped rule selection for this window
    FilterError { rule: String, message: String },
    Skipped { rule: String, reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowReport {
    pub handle: WindowHandle,
    pub title: String,
    pub program_path: Option<String>,
    #[serde(flatten)]
    pub outcome: WindowOutcome,
}

impl WindowReport {
    pub fn new(window: &ProgramWindow, outcome: WindowOutcome) -> Self {
        Self {
            handle: window.handle,
            title: window.title.clone(),
            program_path: window.program_path.clone(),
            outcome,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub blueprint: String,
    pub dry_run: bool,
    /// enabled rules that cannot match because taskbar info is unavailable
    pub ignored_rules: Vec<String>,
    pub windows: Vec<WindowReport>,
}

impl ApplyReport {
    pub fn placed(&self) -> usize {
        self.count(|o| matches!(o, WindowOutcome::Placed { .. }))
    }

    pub fn unmatched(&self) -> usize {
        self.count(|o| matches!(o, WindowOutcome::NoMatchingRule))
    }

    /// windows skipped or stopped by a filter error
    pub fn failed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                WindowOutcome::Skipped { .. } | WindowOutcome::FilterError { .. }
            )
        })
    }

    pub fn outcome_for(&self, handle: WindowHandle) -> Option<&WindowOutcome> {
        self.windows
            .iter()
            .find(|w| w.handle == handle)
            .map(|w| &w.outcome)
    }

    fn count(&self, pred: impl Fn(&WindowOutcome) -> bool) -> usize {
        self.windows.iter().filter(|w| pred(&w.outcome)).count()
    }
}
