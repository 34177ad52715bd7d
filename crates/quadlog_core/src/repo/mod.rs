//! Repository layer for snapshot persistence.
//!
//! # Responsibility
//! - Define the load/save contract consumed by the unit store.
//! - Isolate SQLite and blob encoding details from service code.
//!
//! # Invariants
//! - The unit collection is always persisted as one blob.

pub mod snapshot_repo;
