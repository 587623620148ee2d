//! Pointer gesture state machines for the presentation layer.
//!
//! # Responsibility
//! - Turn raw pointer coordinates into swipe offsets and drop decisions.
//! - Stay free of rendering concerns; callers draw from the exposed state.

pub mod drag;
pub mod swipe;

pub use drag::{DragOutcome, DragTracker, DropLayout, DropTarget, Rect, Zone};
pub use swipe::{SwipeTracker, AXIS_LOCK_THRESHOLD_PX};
