//! desktop backed by a JSON snapshot of monitors and windows
//!
//! placements are recorded in order instead of moving anything, which makes
//! the snapshot both a portable backend and the fixture format for tests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Desktop, Placement, WindowPlacer};
use crate::display::LiveMonitor;
use crate::window::ProgramWindow;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDesktop {
    #[serde(default)]
    pub taskbar_available: bool,
    #[serde(default)]
    pub monitors: Vec<LiveMonitor>,
    #[serde(default)]
    pub windows: Vec<ProgramWindow>,
    #[serde(skip)]
    placed: Vec<Placement>,
}

impl SnapshotDesktop {
    pub fn new(
        monitors: Vec<LiveMonitor>,
        windows: Vec<ProgramWindow>,
        taskbar_available: bool,
    ) -> Self {
        Self {
            taskbar_available,
            monitors,
            windows,
            placed: Vec::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read desktop snapshot {}", path.display()))?;
        let snapshot = Self::from_json(&content)
            .with_context(|| format!("invalid desktop snapshot {}", path.display()))?;
        debug!(
            path = %path.display(),
            monitors = snapshot.monitors.len(),
            windows = snapshot.windows.len(),
            "loaded desktop snapshot"
        );
        Ok(snapshot)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(content)?;
        Ok(snapshot)
    }
}

impl WindowPlacer for SnapshotDesktop {
    fn place_window(&mut self, placement: &Placement) {
        self.placed.push(*placement);
    }
}

impl Desktop for SnapshotDesktop {
    fn monitors(&self) -> Vec<LiveMonitor> {
        self.monitors.clone()
    }

    fn windows(&self) -> Vec<ProgramWindow> {
        if self.taskbar_available {
            self.windows.clone()
        } else {
            self.windows
                .iter()
                .cloned()
                .map(ProgramWindow::without_taskbar)
                .collect()
        }
    }

    fn taskbar_available(&self) -> bool {
        self.taskbar_available
    }

    fn placements(&self) -> &[Placement] {
        &self.placed
    }
}
