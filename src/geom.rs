//! screen rectangles in virtual desktop coordinates

use serde::{Deserialize, Serialize};

/// edge-based rectangle, right/bottom exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// build from origin and extent, `None` when an edge leaves the i32 range
    pub fn from_origin_size(left: i32, top: i32, width: i32, height: i32) -> Option<Self> {
        Some(Self::new(
            left,
            top,
            left.checked_add(width)?,
            top.checked_add(height)?,
        ))
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// area of the intersection with `other`, zero when disjoint
    pub fn overlap_area(&self, other: &Rect) -> i64 {
        let w = self.right.min(other.right) - self.left.max(other.left);
        let h = self.bottom.min(other.bottom) - self.top.max(other.top);
        if w <= 0 || h <= 0 {
            return 0;
        }
        i64::from(w) * i64::from(h)
    }

    /// squared distance from the centre of this rect to the closest point of `other`
    pub fn distance_sq_to(&self, other: &Rect) -> i64 {
        let cx = i64::from(self.left) + i64::from(self.width()) / 2;
        let cy = i64::from(self.top) + i64::from(self.height()) / 2;
        let dx = if cx < i64::from(other.left) {
            i64::from(other.left) - cx
        } else if cx >= i64::from(other.right) {
            cx - i64::from(other.right) + 1
        } else {
            0
        };
        let dy = if cy < i64::from(other.top) {
            i64::from(other.top) - cy
        } else if cy >= i64::from(other.bottom) {
            cy - i64::from(other.bottom) + 1
        } else {
            0
        };
        dx * dx + dy * dy
    }

    pub fn describe(&self) -> String {
        format!(
            "(left: {}, top: {}, width: {}, height: {})",
            self.left,
            self.top,
            self.width(),
            self.height()
        )
    }
}
