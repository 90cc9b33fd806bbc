use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub monitor_match: BTreeMap<String, MonitorMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub engine_init_scripts: Vec<String>,
    #[serde(default)]
    pub rules: Vec<LayoutRule>,
}

/// physical fingerprint of a monitor, compared by exact equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorMatcher {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub dpi_x: u32,
    pub dpi_y: u32,
}

impl MonitorMatcher {
    pub fn describe(&self) -> String {
        format!(
            "{}x{} at ({}, {}), dpi {}x{}",
            self.width, self.height, self.x, self.y, self.dpi_x, self.dpi_y
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub filters: WindowFilters,
    /// logical monitor name from `monitorMatch`, current monitor when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_monitor: Option<String>,
    #[serde(default)]
    pub target_rect: WindowRect,
    #[serde(default)]
    pub target_state: WindowState,
}

/// regex filters over window attributes; `None` means the field is not checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taskbar_app_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub taskbar_index: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub taskbar_sub_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tool_window: Option<bool>,
}

impl WindowFilters {
    /// true if any filter depends on taskbar introspection
    pub fn uses_taskbar(&self) -> bool {
        self.taskbar_app_id.is_some()
            || self.taskbar_index.is_some()
            || self.taskbar_sub_index.is_some()
    }

    /// all present regex patterns with their field
    pub fn patterns(&self) -> Vec<(FilterField, &str)> {
        [
            (FilterField::WindowTitle, &self.window_title),
            (FilterField::WindowClass, &self.window_class),
            (FilterField::ProgramPath, &self.program_path),
            (FilterField::TaskbarAppId, &self.taskbar_app_id),
            (FilterField::TaskbarIndex, &self.taskbar_index),
            (FilterField::TaskbarSubIndex, &self.taskbar_sub_index),
        ]
        .into_iter()
        .filter_map(|(field, pattern)| pattern.as_deref().map(|p| (field, p)))
        .collect()
    }
}

/// window attribute a filter applies to, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    WindowTitle,
    WindowClass,
    ProgramPath,
    TaskbarAppId,
    TaskbarIndex,
    TaskbarSubIndex,
    IsToolWindow,
}

impl FilterField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WindowTitle => "windowTitle",
            Self::WindowClass => "windowClass",
            Self::ProgramPath => "programPath",
            Self::TaskbarAppId => "taskbarAppId",
            Self::TaskbarIndex => "taskbarIndex",
            Self::TaskbarSubIndex => "taskbarSubIndex",
            Self::IsToolWindow => "isToolWindow",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// target geometry expressions; a missing expression keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default)]
    pub center: bool,
}

impl WindowRect {
    /// present expressions in evaluation order
    pub fn expressions(&self) -> Vec<(RectField, &str)> {
        [
            (RectField::Width, &self.width),
            (RectField::Height, &self.height),
            (RectField::PosX, &self.pos_x),
            (RectField::PosY, &self.pos_y),
        ]
        .into_iter()
        .filter_map(|(field, expr)| expr.as_deref().map(|e| (field, e)))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RectField {
    PosX,
    PosY,
    Width,
    Height,
}

impl fmt::Display for RectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PosX => "posX",
            Self::PosY => "posY",
            Self::Width => "width",
            Self::Height => "height",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowState {
    #[default]
    #[serde(alias = "restored")]
    Restored,
    #[serde(alias = "minimized")]
    Minimized,
    #[serde(alias = "maximized")]
    Maximized,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Restored => "Restored",
            Self::Minimized => "Minimized",
            Self::Maximized => "Maximized",
        };
        f.write_str(name)
    }
}

/// accept `"3"` or `3` for taskbar index filters
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}
