pub mod matching;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::Rect;

/// opaque top-level window identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// snapshot of one visible top-level window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramWindow {
    pub handle: WindowHandle,
    #[serde(rename = "windowRect")]
    pub rect: Rect,
    #[serde(rename = "windowTitle", default)]
    pub title: String,
    #[serde(rename = "windowClass", default)]
    pub class: String,
    /// `None` when the owning process could not be queried
    #[serde(default)]
    pub program_path: Option<String>,
    #[serde(default)]
    pub taskbar_app_id: Option<String>,
    #[serde(default)]
    pub taskbar_index: Option<u32>,
    #[serde(default)]
    pub taskbar_sub_index: Option<u32>,
    #[serde(default)]
    pub is_tool_window: bool,
}

impl ProgramWindow {
    /// file name of the program path, empty when unresolved
    pub fn program_file_name(&self) -> &str {
        // paths come from Windows hosts, so split on both separators
        self.program_path
            .as_deref()
            .and_then(|p| p.rsplit(['\\', '/']).next())
            .unwrap_or("")
    }

    /// drop taskbar attributes, for hosts without taskbar introspection
    pub fn without_taskbar(mut self) -> Self {
        self.taskbar_app_id = None;
        self.taskbar_index = None;
        self.taskbar_sub_index = None;
        self
    }

    pub fn describe(&self) -> String {
        format!("{} ({})", self.handle, self.title)
    }
}

/// windows in processing order: by program file name ignoring case, stable for ties
pub fn sort_for_processing(windows: &[ProgramWindow]) -> Vec<&ProgramWindow> {
    let mut ordered: Vec<&ProgramWindow> = windows.iter().collect();
    ordered.sort_by_cached_key(|w| {
        let name = w.program_file_name();
        (name.to_lowercase(), name.to_string())
    });
    ordered
}
