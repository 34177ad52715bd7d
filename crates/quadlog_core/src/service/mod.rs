//! Core use-case services.
//!
//! # Responsibility
//! - Own the unit collection and its only mutators (rename, record).
//! - Persist after every mutation through a `SnapshotRepository`.
//!
//! # Invariants
//! - A mutation whose save fails is rolled back before returning.

pub mod event_recorder;
pub mod unit_store;
