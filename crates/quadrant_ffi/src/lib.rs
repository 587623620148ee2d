//! Flutter-facing bindings for Quadrant core.

pub mod api;
