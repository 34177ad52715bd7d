//! Core domain logic for quadlog.
//! This crate owns the unit collection, its read-event log and every
//! derived view (recent activity, search, statistics, heat map).

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod stats;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::snapshot::{Snapshot, SnapshotError, UnitRecord};
pub use model::unit::{ReadEvent, ReadKind, Unit, UnitId, UNIT_COUNT};
pub use repo::snapshot_repo::{
    MemorySnapshotRepository, RepoError, RepoResult, SnapshotRepository,
    SqliteSnapshotRepository,
};
pub use search::view_filter::{
    ActivityFilters, ActivitySummary, KindFilter, UnitOverview, ViewFilter,
    RECENT_ACTIVITY_LIMIT,
};
pub use service::event_recorder::EventRecorder;
pub use service::unit_store::{InitOutcome, StoreError, StoreResult, UnitStore};
pub use stats::aggregator::{Stats, StatsAggregator};
pub use stats::heat_map::{HeatCell, HeatMap, Intensity};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
