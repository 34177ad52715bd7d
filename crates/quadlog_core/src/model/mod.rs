//! Domain model for the fixed unit collection and its read log.
//!
//! # Responsibility
//! - Define canonical data structures used by store and analytics code.
//! - Define the persisted snapshot shape and its validation.
//!
//! # Invariants
//! - Exactly `UNIT_COUNT` units exist, with dense ids `1..=UNIT_COUNT`.
//! - Read events are never removed or reordered once appended.

pub mod snapshot;
pub mod unit;
