//! Horizontal swipe-to-reveal tracking for list rows.
//!
//! # Invariants
//! - The axis is locked at most once per press.
//! - After `release` the offset is exactly `-w`, `0` or `+w`.

/// Pointer travel needed before the gesture commits to an axis.
pub const AXIS_LOCK_THRESHOLD_PX: f64 = 10.0;
/// Share of travel past the action width that still moves the row.
const OVERSCROLL_DAMPING: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    x: f64,
    y: f64,
    start_offset: f64,
}

/// Tracks one row's horizontal offset across press/move/release.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeTracker {
    action_width: f64,
    offset: f64,
    press: Option<Press>,
    axis: Option<Axis>,
    disabled: bool,
}

impl SwipeTracker {
    /// `action_width` is the width of the revealed action area on each side.
    pub fn new(action_width: f64) -> Self {
        Self {
            action_width: action_width.abs(),
            offset: 0.0,
            press: None,
            axis: None,
            disabled: false,
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// `true` once the current press committed to horizontal movement.
    pub fn is_swiping(&self) -> bool {
        self.axis == Some(Axis::Horizontal)
    }

    pub fn press(&mut self, x: f64, y: f64) {
        if self.disabled {
            return;
        }
        self.press = Some(Press {
            x,
            y,
            start_offset: self.offset,
        });
        self.axis = None;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        if self.disabled {
            return;
        }
        let Some(press) = self.press else {
            return;
        };
        let dx = x - press.x;
        let dy = y - press.y;

        if self.axis.is_none() {
            if dx.abs() <= AXIS_LOCK_THRESHOLD_PX && dy.abs() <= AXIS_LOCK_THRESHOLD_PX {
                return;
            }
            self.axis = Some(if dx.abs() > dy.abs() {
                Axis::Horizontal
            } else {
                Axis::Vertical
            });
        }

        if self.axis == Some(Axis::Horizontal) {
            self.offset = self.damped(press.start_offset + dx);
        }
    }

    /// Snaps to the nearest resting position and ends the press.
    pub fn release(&mut self) -> f64 {
        if self.disabled {
            return self.offset;
        }
        let half = self.action_width / 2.0;
        self.offset = if self.offset > half {
            self.action_width
        } else if self.offset < -half {
            -self.action_width
        } else {
            0.0
        };
        self.press = None;
        self.axis = None;
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.press = None;
        self.axis = None;
    }

    /// Disabling also drops any press in progress.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.press = None;
            self.axis = None;
        }
    }

    fn damped(&self, raw: f64) -> f64 {
        let w = self.action_width;
        if raw > w {
            w + (raw - w) * OVERSCROLL_DAMPING
        } else if raw < -w {
            -w + (raw + w) * OVERSCROLL_DAMPING
        } else {
            raw
        }
    }
}
