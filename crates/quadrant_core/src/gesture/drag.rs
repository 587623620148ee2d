//! Drag-and-drop tracking between the inbox and the four quadrants.
//!
//! # Responsibility
//! - Follow one dragged entity from press to release.
//! - Resolve the drop zone and insertion index under the pointer.
//! - Tell taps apart from drags.
//!
//! # Invariants
//! - `release` always clears the drag state.
//! - Once travel exceeds `TAP_SLOP_PX` the gesture can no longer be a tap.

use crate::kv::KvStore;
use crate::model::task::{Category, TaskId};
use crate::service::store::TaskStore;

/// Pointer travel after which a press counts as a drag.
pub const TAP_SLOP_PX: f64 = 5.0;

/// Axis-aligned rectangle in layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Drop zones on the matrix screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Inbox,
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Zone {
    pub fn category(self) -> Category {
        match self {
            Self::Inbox => Category::Inbox,
            Self::Q1 => Category::Q1,
            Self::Q2 => Category::Q2,
            Self::Q3 => Category::Q3,
            Self::Q4 => Category::Q4,
        }
    }
}

impl From<Category> for Zone {
    fn from(value: Category) -> Self {
        match value {
            Category::Inbox => Self::Inbox,
            Category::Q1 => Self::Q1,
            Category::Q2 => Self::Q2,
            Category::Q3 => Self::Q3,
            Category::Q4 => Self::Q4,
        }
    }
}

/// Geometry snapshot supplied by the presentation layer on every move.
pub trait DropLayout {
    /// Zone whose bounds contain the point, if any.
    fn zone_at(&self, x: f64, y: f64) -> Option<Zone>;
    /// Rectangles of the zone's visible rows, top to bottom.
    fn child_rects(&self, zone: Zone) -> &[Rect];
}

/// Where a release would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub zone: Zone,
    pub index: usize,
}

impl DropTarget {
    pub fn category(&self) -> Category {
        self.zone.category()
    }
}

/// Result of `DragTracker::release`.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome<E> {
    Dropped { entity: E, target: DropTarget },
    Missed { entity: E, origin_zone: Zone },
    Tap { entity: E },
    Idle,
}

impl<E> DragOutcome<E> {
    /// A drag that left the inbox and landed nowhere reopens the inbox panel.
    pub fn should_reopen_inbox(&self) -> bool {
        matches!(
            self,
            Self::Missed {
                origin_zone: Zone::Inbox,
                ..
            }
        )
    }
}

impl DragOutcome<TaskId> {
    /// Reorders the dropped task into its target. Returns whether a drop
    /// was applied.
    pub fn apply_to<K: KvStore>(&self, store: &mut TaskStore<K>) -> bool {
        match self {
            Self::Dropped { entity, target } => {
                store.reorder_task(*entity, target.category(), target.index);
                true
            }
            Self::Missed { .. } | Self::Tap { .. } | Self::Idle => false,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveDrag<E> {
    entity: E,
    origin_zone: Zone,
    start: (f64, f64),
    pointer: (f64, f64),
    anchor: (f64, f64),
    target: Option<DropTarget>,
    dragged: bool,
}

#[derive(Debug, Clone)]
pub struct DragTracker<E> {
    active: Option<ActiveDrag<E>>,
}

impl<E> Default for DragTracker<E> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<E> DragTracker<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// `true` once the current press moved past the tap slop.
    pub fn is_dragging(&self) -> bool {
        self.active.as_ref().is_some_and(|drag| drag.dragged)
    }

    pub fn entity(&self) -> Option<&E> {
        self.active.as_ref().map(|drag| &drag.entity)
    }

    pub fn target(&self) -> Option<DropTarget> {
        self.active.as_ref().and_then(|drag| drag.target)
    }

    /// Top-left corner for the ghost so it stays under the grab point.
    pub fn ghost_origin(&self) -> Option<(f64, f64)> {
        self.active.as_ref().map(|drag| {
            (
                drag.pointer.0 - drag.anchor.0,
                drag.pointer.1 - drag.anchor.1,
            )
        })
    }

    /// Begins tracking; replaces any drag still in progress.
    pub fn start_drag(&mut self, entity: E, origin_zone: Zone, x: f64, y: f64, origin_rect: Rect) {
        self.active = Some(ActiveDrag {
            entity,
            origin_zone,
            start: (x, y),
            pointer: (x, y),
            anchor: (x - origin_rect.x, y - origin_rect.y),
            target: None,
            dragged: false,
        });
    }

    pub fn move_to(&mut self, x: f64, y: f64, layout: &impl DropLayout) {
        let Some(drag) = self.active.as_mut() else {
            return;
        };
        drag.pointer = (x, y);
        let travel = (x - drag.start.0).hypot(y - drag.start.1);
        if travel > TAP_SLOP_PX {
            drag.dragged = true;
        }
        drag.target = layout.zone_at(x, y).map(|zone| DropTarget {
            zone,
            index: insertion_index(layout.child_rects(zone), y),
        });
    }

    pub fn release(&mut self) -> DragOutcome<E> {
        let Some(drag) = self.active.take() else {
            return DragOutcome::Idle;
        };
        if !drag.dragged {
            return DragOutcome::Tap {
                entity: drag.entity,
            };
        }
        match drag.target {
            Some(target) => DragOutcome::Dropped {
                entity: drag.entity,
                target,
            },
            None => DragOutcome::Missed {
                entity: drag.entity,
                origin_zone: drag.origin_zone,
            },
        }
    }

    /// Drops the drag without an outcome.
    pub fn cancel(&mut self) {
        self.active = None;
    }
}

/// Index of the first row whose midpoint lies below `y`, else the row count.
fn insertion_index(children: &[Rect], y: f64) -> usize {
    children
        .iter()
        .position(|rect| y < rect.mid_y())
        .unwrap_or(children.len())
}
