//! maps a blueprint's logical monitor names onto live monitors
//!
//! the same function serves pre-flight blueprint selection and the re-check
//! right before application, so both see identical rules.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{LiveMonitor, MonitorHandle};
use crate::blueprint::Blueprint;

/// reason a monitor match is invalid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonitorMatchIssue {
    /// blueprint declares no monitors at all
    Empty,
    /// no live monitor has this fingerprint
    Unmatched { name: String },
    /// several live monitors share this fingerprint
    Ambiguous { name: String, count: usize },
    /// several logical names resolve to one physical monitor
    Aliased {
        names: Vec<String>,
        handle: MonitorHandle,
    },
}

impl fmt::Display for MonitorMatchIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "blueprint has an empty monitorMatch"),
            Self::Unmatched { name } => {
                write!(f, "monitor '{}' has no matching live monitor", name)
            }
            Self::Ambiguous { name, count } => write!(
                f,
                "monitor '{}' matches {} live monitors with identical geometry",
                name, count
            ),
            Self::Aliased { names, handle } => write!(
                f,
                "monitors {} all map to the same live monitor {}",
                names
                    .iter()
                    .map(|n| format!("'{}'", n))
                    .collect::<Vec<_>>()
                    .join(", "),
                handle
            ),
        }
    }
}

/// outcome of matching: one entry per logical name plus any issues
#[derive(Debug, Clone)]
pub struct MonitorMatch {
    pub entries: BTreeMap<String, Option<LiveMonitor>>,
    pub issues: Vec<MonitorMatchIssue>,
}

impl MonitorMatch {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// the validated 1:1 mapping, or the issues that prevent it
    pub fn into_mapping(self) -> Result<MonitorMapping, Vec<MonitorMatchIssue>> {
        if !self.issues.is_empty() {
            return Err(self.issues);
        }
        let monitors = self
            .entries
            .into_iter()
            .filter_map(|(name, monitor)| monitor.map(|m| (name, m)))
            .collect();
        Ok(MonitorMapping { monitors })
    }
}

/// validated logical name -> live monitor mapping
#[derive(Debug, Clone, Default)]
pub struct MonitorMapping {
    monitors: BTreeMap<String, LiveMonitor>,
}

impl MonitorMapping {
    pub fn get(&self, name: &str) -> Option<&LiveMonitor> {
        self.monitors.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.monitors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LiveMonitor)> {
        self.monitors.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// match every `monitorMatch` entry against the live monitors
pub fn validate_monitor_match(blueprint: &Blueprint, monitors: &[LiveMonitor]) -> MonitorMatch {
    let mut entries = BTreeMap::new();
    let mut issues = Vec::new();

    if blueprint.monitor_match.is_empty() {
        issues.push(MonitorMatchIssue::Empty);
    }

    for (name, matcher) in &blueprint.monitor_match {
        let candidates: Vec<&LiveMonitor> = monitors.iter().filter(|m| m.matches(matcher)).collect();

        let resolved = match candidates.as_slice() {
            [] => {
                issues.push(MonitorMatchIssue::Unmatched { name: name.clone() });
                None
            }
            [single] => Some((*single).clone()),
            many => {
                issues.push(MonitorMatchIssue::Ambiguous {
                    name: name.clone(),
                    count: many.len(),
                });
                None
            }
        };
        entries.insert(name.clone(), resolved);
    }

    let mut by_handle: BTreeMap<MonitorHandle, Vec<String>> = BTreeMap::new();
    for (name, monitor) in &entries {
        if let Some(monitor) = monitor {
            by_handle
                .entry(monitor.handle)
                .or_default()
                .push(name.clone());
        }
    }
    for (handle, names) in by_handle {
        if names.len() > 1 {
            issues.push(MonitorMatchIssue::Aliased { names, handle });
        }
    }

    MonitorMatch { entries, issues }
}
