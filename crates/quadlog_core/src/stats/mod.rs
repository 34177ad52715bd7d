//! Summary counters and the daily activity heat map.

pub mod aggregator;
pub mod heat_map;
