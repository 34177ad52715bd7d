//! Flutter-facing adapter over `quadlog_core`.

pub mod api;
pub mod config;
