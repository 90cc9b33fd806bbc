//! target rectangle evaluation
//!
//! order is fixed: width, height, centering on the full monitor rect, then
//! posX and posY. an explicit position always beats centering.

use crate::blueprint::{LayoutRule, RectField, WindowRect, WindowState};
use crate::display::LiveMonitor;
use crate::geom::Rect;
use crate::script::{MonitorVars, ScriptContext, ScriptError};

/// computed placement for one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub rect: Rect,
    pub state: WindowState,
}

/// evaluate `rule`'s target rect relative to `monitor`, starting from `current`
pub fn compute_target(
    ctx: &mut ScriptContext,
    current: Rect,
    rule: &LayoutRule,
    monitor: &LiveMonitor,
) -> Result<Target, ScriptError> {
    ctx.bind_monitor(&MonitorVars::of(monitor));
    let rect = evaluate_rect(ctx, current, &rule.target_rect, &monitor.monitor_rect)?;
    Ok(Target {
        rect,
        state: rule.target_state,
    })
}

fn evaluate_rect(
    ctx: &mut ScriptContext,
    current: Rect,
    spec: &WindowRect,
    monitor_rect: &Rect,
) -> Result<Rect, ScriptError> {
    let mut left = current.left;
    let mut top = current.top;
    let mut width = coordinate(
        "current width",
        i64::from(current.right) - i64::from(current.left),
    )?;
    let mut height = coordinate(
        "current height",
        i64::from(current.bottom) - i64::from(current.top),
    )?;

    if let Some(expr) = &spec.width {
        width = eval_field(ctx, RectField::Width, expr)?;
    }
    if let Some(expr) = &spec.height {
        height = eval_field(ctx, RectField::Height, expr)?;
    }

    if spec.center {
        left = centered(RectField::Width, monitor_rect.left, monitor_rect.width(), width)?;
        top = centered(RectField::Height, monitor_rect.top, monitor_rect.height(), height)?;
    }

    if let Some(expr) = &spec.pos_x {
        left = eval_field(ctx, RectField::PosX, expr)?;
    }
    if let Some(expr) = &spec.pos_y {
        top = eval_field(ctx, RectField::PosY, expr)?;
    }

    Rect::from_origin_size(left, top, width, height).ok_or_else(|| ScriptError::OutOfRange {
        what: "target rect".to_string(),
        value: format!("{}x{} at ({}, {})", width, height, left, top),
    })
}

fn eval_field(ctx: &mut ScriptContext, field: RectField, expr: &str) -> Result<i32, ScriptError> {
    ctx.eval_number(&format!("{} expression", field), expr)
}

/// leading edge that centres `size` within `extent` starting at `start`
fn centered(field: RectField, start: i32, extent: i32, size: i32) -> Result<i32, ScriptError> {
    extent
        .checked_sub(size)
        .and_then(|free| start.checked_add(free / 2))
        .ok_or_else(|| ScriptError::OutOfRange {
            what: format!("{} expression", field),
            value: size.to_string(),
        })
}

fn coordinate(what: &str, value: i64) -> Result<i32, ScriptError> {
    i32::try_from(value).map_err(|_| ScriptError::OutOfRange {
        what: what.to_string(),
        value: value.to_string(),
    })
}
