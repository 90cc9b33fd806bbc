mod matcher;

pub use matcher::{validate_monitor_match, MonitorMapping, MonitorMatch, MonitorMatchIssue};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blueprint::MonitorMatcher;
use crate::geom::Rect;

/// opaque monitor identity, only unique within one enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorHandle(pub u64);

impl fmt::Display for MonitorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMonitor {
    pub handle: MonitorHandle,
    pub name: String,
    pub monitor_rect: Rect,
    pub work_area_rect: Rect,
    pub dpi_x: u32,
    pub dpi_y: u32,
}

impl LiveMonitor {
    /// true if geometry and DPI equal the fingerprint exactly
    pub fn matches(&self, matcher: &MonitorMatcher) -> bool {
        self.monitor_rect.left == matcher.x
            && self.monitor_rect.top == matcher.y
            && self.monitor_rect.width() == matcher.width
            && self.monitor_rect.height() == matcher.height
            && self.dpi_x == matcher.dpi_x
            && self.dpi_y == matcher.dpi_y
    }

    /// fingerprint of this monitor, as it would be written in a blueprint
    pub fn fingerprint(&self) -> MonitorMatcher {
        MonitorMatcher {
            x: self.monitor_rect.left,
            y: self.monitor_rect.top,
            width: self.monitor_rect.width(),
            height: self.monitor_rect.height(),
            dpi_x: self.dpi_x,
            dpi_y: self.dpi_y,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "'{}' (x: {}, y: {}, width: {}, height: {}, dpiX: {}, dpiY: {})",
            self.name,
            self.monitor_rect.left,
            self.monitor_rect.top,
            self.monitor_rect.width(),
            self.monitor_rect.height(),
            self.dpi_x,
            self.dpi_y
        )
    }
}

/// monitor a rectangle belongs to: largest overlap, else nearest
pub fn monitor_for_rect<'a>(rect: &Rect, monitors: &'a [LiveMonitor]) -> Option<&'a LiveMonitor> {
    let best_overlap = monitors
        .iter()
        .map(|m| (m, rect.overlap_area(&m.monitor_rect)))
        .filter(|(_, area)| *area > 0)
        .max_by_key(|(_, area)| *area);

    if let Some((monitor, _)) = best_overlap {
        return Some(monitor);
    }

    // min_by_key keeps the first of equal candidates, so ties go to enumeration order
    monitors
        .iter()
        .min_by_key(|m| rect.distance_sq_to(&m.monitor_rect))
}

pub fn find_by_handle(handle: MonitorHandle, monitors: &[LiveMonitor]) -> Option<&LiveMonitor> {
    monitors.iter().find(|m| m.handle == handle)
}
