//! Core use-case services.
//!
//! # Responsibility
//! - Own the canonical task/habit collections behind the store API.
//! - Keep presentation and FFI layers decoupled from slot storage.

pub mod clock;
pub mod export;
pub mod feedback;
pub mod ordering;
pub mod store;
