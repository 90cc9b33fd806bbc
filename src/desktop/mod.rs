//! desktop collaborators: monitor and window enumeration plus placement

mod snapshot;

pub use snapshot::SnapshotDesktop;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::blueprint::WindowState;
use crate::display::{monitor_for_rect, LiveMonitor, MonitorHandle};
use crate::geom::Rect;
use crate::window::{ProgramWindow, WindowHandle};

/// env var naming a snapshot file to use instead of the native desktop
pub const DESKTOP_ENV: &str = "BWM_DESKTOP";

/// a window move handed to the placement backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub handle: WindowHandle,
    pub rect: Rect,
    pub state: WindowState,
}

/// placement side of the desktop, also used by the applier to read live state
pub trait WindowPlacer {
    /// current window rect, `None` if it can no longer be read
    fn current_rect(&self, window: &ProgramWindow) -> Option<Rect> {
        Some(window.rect)
    }

    /// monitor the window is currently on
    fn current_monitor(
        &self,
        window: &ProgramWindow,
        monitors: &[LiveMonitor],
    ) -> Option<MonitorHandle> {
        let rect = self.current_rect(window)?;
        monitor_for_rect(&rect, monitors).map(|m| m.handle)
    }

    /// fire-and-forget placement
    fn place_window(&mut self, placement: &Placement);
}

pub trait Desktop: WindowPlacer {
    fn monitors(&self) -> Vec<LiveMonitor>;

    /// visible top-level windows; taskbar fields are empty when
    /// [`Desktop::taskbar_available`] is false
    fn windows(&self) -> Vec<ProgramWindow>;

    fn taskbar_available(&self) -> bool;

    /// placements performed so far, for backends that record them
    fn placements(&self) -> &[Placement] {
        &[]
    }
}

/// open the desktop backend: a snapshot file when one is given, else native
pub fn open(snapshot: Option<&str>) -> Result<Box<dyn Desktop>> {
    let path = snapshot
        .map(str::to_string)
        .or_else(|| std::env::var(DESKTOP_ENV).ok().filter(|p| !p.is_empty()));

    match path {
        Some(path) => Ok(Box::new(SnapshotDesktop::load(&path)?)),
        None => native(),
    }
}

#[cfg(target_os = "windows")]
fn native() -> Result<Box<dyn Desktop>> {
    Err(anyhow!(
        "native desktop introspection is not built in; pass --desktop <snapshot.json>"
    ))
}

#[cfg(not(target_os = "windows"))]
fn native() -> Result<Box<dyn Desktop>> {
    Err(anyhow!(
        "native desktop introspection is only supported on Windows; pass --desktop <snapshot.json> or set {}",
        DESKTOP_ENV
    ))
}
