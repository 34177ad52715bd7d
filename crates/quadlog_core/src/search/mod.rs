//! Read-only projections over the unit collection.
//!
//! # Responsibility
//! - Recent-activity list, recency-ordered unit grid and unit search.

pub mod view_filter;
