//! filter matching and first-match rule selection
//!
//! patterns are unanchored: a filter passes when the pattern matches
//! anywhere in the attribute. an invalid pattern is a structural error and
//! stops rule selection for the whole window.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::ProgramWindow;
use crate::blueprint::{FilterField, LayoutRule, WindowFilters};

/// a filter pattern that failed to compile
#[derive(Debug, Clone, Error)]
#[error("invalid {field} pattern '{pattern}' in rule '{rule}': {source}")]
pub struct FilterError {
    pub rule: String,
    pub field: FilterField,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// compiled patterns keyed by source, shared across all windows of a run
#[derive(Debug, Default)]
pub struct RegexCache {
    compiled: HashMap<String, Regex>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// compiled regex for `pattern`, compiling on first use
    pub fn get_or_compile(&mut self, pattern: &str) -> Result<&Regex, regex::Error> {
        if !self.compiled.contains_key(pattern) {
            let regex = Regex::new(pattern)?;
            self.compiled.insert(pattern.to_string(), regex);
        }
        Ok(&self.compiled[pattern])
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// evaluate `filters` against `window`; `Err` only for invalid patterns
pub fn matches(
    window: &ProgramWindow,
    filters: &WindowFilters,
    rule_name: &str,
    cache: &mut RegexCache,
) -> Result<bool, FilterError> {
    let taskbar_index = window
        .taskbar_index
        .map(|i| i.to_string())
        .unwrap_or_default();
    let taskbar_sub_index = window
        .taskbar_sub_index
        .map(|i| i.to_string())
        .unwrap_or_default();

    let checks: [(FilterField, &Option<String>, Option<&str>); 6] = [
        (
            FilterField::WindowTitle,
            &filters.window_title,
            Some(window.title.as_str()),
        ),
        (
            FilterField::WindowClass,
            &filters.window_class,
            Some(window.class.as_str()),
        ),
        (
            FilterField::ProgramPath,
            &filters.program_path,
            window.program_path.as_deref(),
        ),
        (
            FilterField::TaskbarAppId,
            &filters.taskbar_app_id,
            window.taskbar_app_id.as_deref(),
        ),
        (
            FilterField::TaskbarIndex,
            &filters.taskbar_index,
            Some(taskbar_index.as_str()),
        ),
        (
            FilterField::TaskbarSubIndex,
            &filters.taskbar_sub_index,
            Some(taskbar_sub_index.as_str()),
        ),
    ];

    for (field, pattern, value) in checks {
        let Some(pattern) = pattern else {
            continue;
        };

        // compile before looking at the value: a broken pattern is an error
        // even when the attribute is missing
        let regex = cache.get_or_compile(pattern).map_err(|source| FilterError {
            rule: rule_name.to_string(),
            field,
            pattern: pattern.clone(),
            source,
        })?;

        match value {
            Some(value) if regex.is_match(value) => {}
            _ => return Ok(false),
        }
    }

    if let Some(expected) = filters.is_tool_window {
        if expected != window.is_tool_window {
            return Ok(false);
        }
    }

    Ok(true)
}

/// rule chosen for a window, with its position in the blueprint
#[derive(Debug, Clone, Copy)]
pub struct SelectedRule<'a> {
    pub index: usize,
    pub rule: &'a LayoutRule,
}

/// first enabled rule whose filters all pass
///
/// rules that need taskbar attributes never match when `taskbar_available`
/// is false. a pattern error stops the walk: later rules are not tried.
pub fn select_rule<'a>(
    window: &ProgramWindow,
    rules: &'a [LayoutRule],
    taskbar_available: bool,
    cache: &mut RegexCache,
) -> Result<Option<SelectedRule<'a>>, FilterError> {
    for (index, rule) in rules.iter().enumerate() {
        if !rule.enabled {
            continue;
        }
        if !taskbar_available && rule.filters.uses_taskbar() {
            continue;
        }

        if matches(window, &rule.filters, &rule.name, cache)? {
            debug!(rule = %rule.name, window = %window.handle, "rule matches");
            return Ok(Some(SelectedRule { index, rule }));
        }
    }

    Ok(None)
}

/// names of enabled rules that can never match on a host without taskbar info
pub fn taskbar_dependent_rules(rules: &[LayoutRule]) -> Vec<String> {
    rules
        .iter()
        .filter(|r| r.enabled && r.filters.uses_taskbar())
        .map(|r| r.name.clone())
        .collect()
}
