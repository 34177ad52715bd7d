//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose store mutations and read-only views as plain data.
//! - Translate core errors into envelope messages.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Kinds cross as `recitation|memorization`, days as `YYYY-MM-DD`,
//!   instants as epoch milliseconds.
//! - Store access is serialized within the process, so concurrent calls
//!   never lose each other's writes.
//! - A corrupt snapshot is never overwritten implicitly: every call fails
//!   with `ok == false` until `reset_corrupt_store` is called.

use crate::config::config;
use chrono::NaiveDate;
use log::warn;
use once_cell::sync::Lazy;
use quadlog_core::db::open_db;
use quadlog_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ActivityFilters,
    Clock, EventRecorder, InitOutcome, KindFilter, ReadKind, RepoError, SnapshotRepository,
    SqliteSnapshotRepository, StatsAggregator, StoreError, StoreResult, SystemClock, Unit,
    UnitOverview, UnitStore, ViewFilter,
};
use std::sync::Mutex;

static STORE_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// A blank `level` uses the configured default (`QUADLOG_LOG_LEVEL`).
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = if level.trim().is_empty() {
        config().log_level.clone()
    } else {
        level
    };
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for mutating calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Unit affected by the action.
    pub unit_id: Option<u32>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, unit_id: u32) -> Self {
        Self {
            ok: true,
            unit_id: Some(unit_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            unit_id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityItem {
    pub unit_id: u32,
    pub unit_name: String,
    pub kind: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityResponse {
    pub ok: bool,
    /// Empty list means the empty-state screen.
    pub items: Vec<ActivityItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitItem {
    pub unit_id: u32,
    pub name: String,
    pub latest_timestamp_ms: Option<i64>,
    pub recitation_count: u32,
    pub memorization_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitListResponse {
    pub ok: bool,
    pub items: Vec<UnitItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub kind: String,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryResponse {
    pub ok: bool,
    pub unit_name: String,
    /// Newest first.
    pub items: Vec<HistoryItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsResponse {
    pub ok: bool,
    pub total_events: u32,
    pub recitation_count: u32,
    pub memorization_count: u32,
    pub units_touched: u32,
    pub named_units: u32,
    pub active_day_count: u32,
    pub completion_percent: f64,
    pub average_per_active_day: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatCellItem {
    /// Calendar day as `YYYY-MM-DD`.
    pub date: String,
    pub count: u32,
    /// 0 (no activity) to 4.
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatMapResponse {
    pub ok: bool,
    /// 53 weeks x 7 days, week-major.
    pub cells: Vec<HeatCellItem>,
    pub message: String,
}

/// Records one completion for the unit matching `identifier`.
///
/// `identifier` is a unit id or an exact unit name (case-insensitive).
#[flutter_rust_bridge::frb(sync)]
pub fn record_read(identifier: String, kind: String) -> ActionResponse {
    let Some(kind) = ReadKind::parse(&kind) else {
        return ActionResponse::failure(format!("record_read failed: unknown kind `{kind}`"));
    };
    let clock = SystemClock;
    match with_store(|store| {
        EventRecorder::new(store, &clock).record_by_identifier(&identifier, kind)
    }) {
        Ok((unit_id, _)) => ActionResponse::success(
            format!("Read recorded for unit {unit_id}."),
            unit_id.get(),
        ),
        Err(err) => ActionResponse::failure(format!("record_read failed: {err}")),
    }
}

/// Renames one unit; a blank name clears it.
#[flutter_rust_bridge::frb(sync)]
pub fn rename_unit(unit_id: u32, name: String) -> ActionResponse {
    match with_store(|store| store.rename(unit_id, &name)) {
        Ok(()) => ActionResponse::success("Unit renamed.", unit_id),
        Err(err) => ActionResponse::failure(format!("rename_unit failed: {err}")),
    }
}

/// Latest read per unit, filtered and capped at 24 rows.
///
/// `date` is `YYYY-MM-DD` or `None`; `kind` is a kind label, `all` or blank.
#[flutter_rust_bridge::frb(sync)]
pub fn recent_activity(date: Option<String>, kind: String, text: String) -> ActivityResponse {
    let filters = match parse_filters(date, &kind, text) {
        Ok(filters) => filters,
        Err(message) => {
            return ActivityResponse {
                ok: false,
                items: Vec::new(),
                message: format!("recent_activity failed: {message}"),
            }
        }
    };

    let clock = SystemClock;
    match with_store(|store| {
        Ok(ViewFilter::new(store.units(), &clock)
            .recent_activity(&filters)
            .into_iter()
            .map(|row| ActivityItem {
                unit_id: row.unit_id.get(),
                unit_name: row.unit_name,
                kind: row.latest_kind.as_str().to_string(),
                timestamp_ms: row.latest_timestamp.timestamp_millis(),
            })
            .collect::<Vec<_>>())
    }) {
        Ok(items) => {
            let message = if items.is_empty() {
                "No reads yet.".to_string()
            } else {
                format!("Found {} unit(s).", items.len())
            };
            ActivityResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => ActivityResponse {
            ok: false,
            items: Vec::new(),
            message: format!("recent_activity failed: {err}"),
        },
    }
}

/// Units whose id or name contains `term`; blank term returns nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn search_units(term: String) -> UnitListResponse {
    let clock = SystemClock;
    unit_list("search_units", |store| {
        ViewFilter::new(store.units(), &clock)
            .search(&term)
            .into_iter()
            .map(unit_item)
            .collect()
    })
}

/// Every unit, most recently read first.
#[flutter_rust_bridge::frb(sync)]
pub fn units_by_recency() -> UnitListResponse {
    let clock = SystemClock;
    unit_list("units_by_recency", |store| {
        ViewFilter::new(store.units(), &clock)
            .all_units_by_recency()
            .into_iter()
            .map(overview_item)
            .collect()
    })
}

/// Full read history of one unit.
#[flutter_rust_bridge::frb(sync)]
pub fn unit_history(unit_id: u32) -> HistoryResponse {
    let clock = SystemClock;
    let result = with_store(|store| {
        let unit_name = store.get_unit(unit_id)?.name().to_string();
        let items = ViewFilter::new(store.units(), &clock)
            .unit_history(unit_id)?
            .iter()
            .map(|event| HistoryItem {
                kind: event.kind.as_str().to_string(),
                timestamp_ms: event.timestamp.timestamp_millis(),
            })
            .collect::<Vec<_>>();
        Ok((unit_name, items))
    });

    match result {
        Ok((unit_name, items)) => HistoryResponse {
            ok: true,
            message: format!("{} read(s).", items.len()),
            unit_name,
            items,
        },
        Err(err) => HistoryResponse {
            ok: false,
            unit_name: String::new(),
            items: Vec::new(),
            message: format!("unit_history failed: {err}"),
        },
    }
}

/// Summary counters for the statistics screen.
#[flutter_rust_bridge::frb(sync)]
pub fn stats_summary() -> StatsResponse {
    let clock = SystemClock;
    match with_store(|store| Ok(StatsAggregator::new(store.units(), &clock).summarize())) {
        Ok(stats) => StatsResponse {
            ok: true,
            total_events: to_u32(stats.total_events),
            recitation_count: to_u32(stats.recitation_count),
            memorization_count: to_u32(stats.memorization_count),
            units_touched: to_u32(stats.units_touched),
            named_units: to_u32(stats.named_units),
            active_day_count: to_u32(stats.active_day_count),
            completion_percent: stats.completion_percent,
            average_per_active_day: stats.average_per_active_day,
            message: String::new(),
        },
        Err(err) => StatsResponse {
            ok: false,
            total_events: 0,
            recitation_count: 0,
            memorization_count: 0,
            units_touched: 0,
            named_units: 0,
            active_day_count: 0,
            completion_percent: 0.0,
            average_per_active_day: 0.0,
            message: format!("stats_summary failed: {err}"),
        },
    }
}

/// Activity heat map ending today.
#[flutter_rust_bridge::frb(sync)]
pub fn heat_map() -> HeatMapResponse {
    let clock = SystemClock;
    match with_store(|store| {
        let aggregator = StatsAggregator::new(store.units(), &clock);
        Ok(aggregator.heat_map(clock.now()))
    }) {
        Ok(map) => HeatMapResponse {
            ok: true,
            cells: map
                .cells()
                .iter()
                .map(|cell| HeatCellItem {
                    date: cell.date.format(DATE_FORMAT).to_string(),
                    count: to_u32(cell.count),
                    level: cell.intensity.level(),
                })
                .collect(),
            message: String::new(),
        },
        Err(err) => HeatMapResponse {
            ok: false,
            cells: Vec::new(),
            message: format!("heat_map failed: {err}"),
        },
    }
}

/// Health of the stored snapshot, read without modifying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatusResponse {
    pub ok: bool,
    /// Stored snapshot exists but cannot be loaded.
    pub corrupt: bool,
    pub message: String,
}

/// Reports whether the stored snapshot loads, without touching it.
#[flutter_rust_bridge::frb(sync)]
pub fn store_status() -> StoreStatusResponse {
    let result = with_repo(|repo| match repo.load() {
        Ok(None) => Ok(None),
        Ok(Some(snapshot)) => Ok(snapshot.into_units().err()),
        Err(RepoError::Snapshot(err)) => Ok(Some(err)),
        Err(err) => Err(err.to_string()),
    });

    match result {
        Ok(None) => StoreStatusResponse {
            ok: true,
            corrupt: false,
            message: "Store is readable.".to_string(),
        },
        Ok(Some(reason)) => StoreStatusResponse {
            ok: false,
            corrupt: true,
            message: format!("corrupt snapshot: {reason}"),
        },
        Err(err) => StoreStatusResponse {
            ok: false,
            corrupt: false,
            message: format!("store_status failed: {err}"),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetResponse {
    pub ok: bool,
    /// `true` when stored data was discarded.
    pub reset: bool,
    pub message: String,
}

/// Replaces a corrupt snapshot with a fresh collection.
///
/// A readable snapshot is left as it is; `reset` tells the caller whether
/// stored data was discarded.
#[flutter_rust_bridge::frb(sync)]
pub fn reset_corrupt_store() -> ResetResponse {
    let result = with_repo(|repo| {
        UnitStore::open_or_reset(repo)
            .map(|(_, outcome)| outcome)
            .map_err(|err| err.to_string())
    });

    match result {
        Ok(InitOutcome::ResetAfterCorruption(reason)) => {
            warn!("event=store_reset module=ffi status=warn reason={reason}");
            ResetResponse {
                ok: true,
                reset: true,
                message: format!("Corrupt snapshot discarded ({reason}); started fresh."),
            }
        }
        Ok(InitOutcome::Restored | InitOutcome::Fresh) => ResetResponse {
            ok: true,
            reset: false,
            message: "Store is readable; nothing was reset.".to_string(),
        },
        Err(err) => ResetResponse {
            ok: false,
            reset: false,
            message: format!("reset_corrupt_store failed: {err}"),
        },
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_filters(
    date: Option<String>,
    kind: &str,
    text: String,
) -> Result<ActivityFilters, String> {
    let date = match date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map_err(|_| format!("invalid date `{value}`, expected YYYY-MM-DD"))?,
        ),
    };
    let kind = match kind.trim() {
        "" => KindFilter::All,
        value if value.eq_ignore_ascii_case("all") => KindFilter::All,
        value => KindFilter::Only(
            ReadKind::parse(value).ok_or_else(|| format!("unknown kind `{value}`"))?,
        ),
    };
    Ok(ActivityFilters { date, kind, text })
}

fn unit_list(
    operation: &str,
    build: impl FnOnce(&UnitStore<SqliteSnapshotRepository<'_>>) -> Vec<UnitItem>,
) -> UnitListResponse {
    match with_store(|store| Ok(build(store))) {
        Ok(items) => UnitListResponse {
            ok: true,
            message: if items.is_empty() {
                "No results.".to_string()
            } else {
                format!("Found {} unit(s).", items.len())
            },
            items,
        },
        Err(err) => UnitListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{operation} failed: {err}"),
        },
    }
}

fn with_store<T>(
    f: impl FnOnce(&mut UnitStore<SqliteSnapshotRepository<'_>>) -> StoreResult<T>,
) -> Result<T, String> {
    with_repo(|repo| {
        let mut store = UnitStore::initialize(repo).map_err(describe_store_error)?;
        f(&mut store).map_err(describe_store_error)
    })
}

fn with_repo<T>(
    f: impl FnOnce(SqliteSnapshotRepository<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let _guard = STORE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let conn = open_db(&config().db_path).map_err(|err| format!("store DB open failed: {err}"))?;
    let repo = SqliteSnapshotRepository::try_new(&conn)
        .map_err(|err| format!("store repo init failed: {err}"))?;
    f(repo)
}

fn describe_store_error(err: StoreError) -> String {
    if matches!(err, StoreError::CorruptSnapshot(_)) {
        format!("{err}; call reset_corrupt_store to start over")
    } else {
        err.to_string()
    }
}

fn unit_item(unit: &Unit) -> UnitItem {
    UnitItem {
        unit_id: unit.id().get(),
        name: unit.name().to_string(),
        latest_timestamp_ms: unit.latest().map(|event| event.timestamp.timestamp_millis()),
        recitation_count: to_u32(unit.count_of(ReadKind::Recitation)),
        memorization_count: to_u32(unit.count_of(ReadKind::Memorization)),
    }
}

fn overview_item(row: UnitOverview) -> UnitItem {
    UnitItem {
        unit_id: row.unit_id.get(),
        name: row.name,
        latest_timestamp_ms: row.latest_timestamp.map(|instant| instant.timestamp_millis()),
        recitation_count: to_u32(row.recitation_count),
        memorization_count: to_u32(row.memorization_count),
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, heat_map, init_logging, parse_filters, record_read, recent_activity,
        rename_unit, reset_corrupt_store, search_units, stats_summary, store_status,
        unit_history, units_by_recency,
    };
    use crate::config::{config, pin_config, AdapterConfig};
    use once_cell::sync::Lazy;
    use quadlog_core::db::open_db;
    use quadlog_core::{
        KindFilter, ReadKind, Snapshot, SnapshotRepository, SqliteSnapshotRepository, UNIT_COUNT,
    };
    use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
    use tempfile::TempDir;

    // One database per test run; writers of corrupt data take it exclusively.
    static TEST_DB: Lazy<RwLock<TempDir>> = Lazy::new(|| {
        RwLock::new(
            tempfile::Builder::new()
                .prefix("quadlog-ffi-")
                .tempdir()
                .unwrap(),
        )
    });

    fn pin_test_db(dir: &TempDir) {
        let pinned = pin_config(AdapterConfig {
            db_path: dir.path().join("quadlog.sqlite3"),
            log_level: "info".to_string(),
        });
        assert!(pinned.db_path.starts_with(dir.path()));
    }

    fn shared_db() -> RwLockReadGuard<'static, TempDir> {
        let guard = TEST_DB.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        pin_test_db(&guard);
        guard
    }

    fn exclusive_db() -> RwLockWriteGuard<'static, TempDir> {
        let guard = TEST_DB.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        pin_test_db(&guard);
        guard
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_relative_log_dir() {
        let error = init_logging("info".to_string(), "tmp/logs".to_string());
        assert!(error.contains("absolute"));
    }

    #[test]
    fn parse_filters_handles_sentinels_and_bad_input() {
        let filters = parse_filters(Some(" ".to_string()), "ALL", String::new()).unwrap();
        assert_eq!(filters.date, None);
        assert_eq!(filters.kind, KindFilter::All);

        let filters = parse_filters(Some("2025-06-15".to_string()), "heart", "7".to_string())
            .unwrap();
        assert_eq!(filters.kind, KindFilter::Only(ReadKind::Memorization));
        assert_eq!(filters.text, "7");

        assert!(parse_filters(Some("15/06/2025".to_string()), "all", String::new()).is_err());
        assert!(parse_filters(None, "listening", String::new()).is_err());
    }

    #[test]
    fn tests_never_touch_the_default_database() {
        let _db = shared_db();
        assert_ne!(
            config().db_path,
            std::env::temp_dir().join("quadlog.sqlite3")
        );
    }

    #[test]
    fn record_read_by_id_then_shows_up_in_views() {
        let _db = shared_db();
        let response = record_read("17".to_string(), "book".to_string());
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.unit_id, Some(17));

        let history = unit_history(17);
        assert!(history.ok, "{}", history.message);
        assert_eq!(history.items[0].kind, "recitation");

        let recent = recent_activity(None, "all".to_string(), "17".to_string());
        assert!(recent.ok, "{}", recent.message);
        assert!(recent.items.iter().any(|item| item.unit_id == 17));

        let grid = units_by_recency();
        assert!(grid.ok, "{}", grid.message);
        assert_eq!(grid.items.len(), 240);
        assert!(grid.items[0].latest_timestamp_ms.is_some());
    }

    #[test]
    fn record_read_reports_bad_input() {
        let _db = shared_db();
        let unknown_unit = record_read("241".to_string(), "recitation".to_string());
        assert!(!unknown_unit.ok);
        assert!(unknown_unit.message.contains("241"));

        let unknown_kind = record_read("1".to_string(), "listening".to_string());
        assert!(!unknown_kind.ok);
        assert!(unknown_kind.message.contains("unknown kind"));
    }

    #[test]
    fn rename_then_search_and_record_by_name() {
        let _db = shared_db();
        let renamed = rename_unit(142, "  Ar-Rahman  ".to_string());
        assert!(renamed.ok, "{}", renamed.message);

        let found = search_units("rahman".to_string());
        assert!(found.items.iter().any(|item| item.unit_id == 142));

        let recorded = record_read("ar-rahman".to_string(), "heart".to_string());
        assert!(recorded.ok, "{}", recorded.message);
        assert_eq!(recorded.unit_id, Some(142));

        assert!(!rename_unit(0, "nothing".to_string()).ok);
    }

    #[test]
    fn stats_and_heat_map_have_expected_shape() {
        let _db = shared_db();
        assert!(record_read("3".to_string(), "memorization".to_string()).ok);

        let stats = stats_summary();
        assert!(stats.ok, "{}", stats.message);
        assert!(stats.total_events >= 1);
        assert!(stats.completion_percent > 0.0);

        let map = heat_map();
        assert!(map.ok, "{}", map.message);
        assert_eq!(map.cells.len(), 371);
        assert!(map.cells[365].count >= 1);
        assert!(map.cells.iter().all(|cell| cell.level <= 4));
    }

    #[test]
    fn blank_search_returns_no_results() {
        let _db = shared_db();
        let response = search_units("   ".to_string());
        assert!(response.ok);
        assert!(response.items.is_empty());
        assert_eq!(response.message, "No results.");
    }

    #[test]
    fn corrupt_snapshot_is_reported_and_only_reset_on_request() {
        let _db = exclusive_db();
        let mut snapshot = Snapshot::fresh();
        snapshot.units.pop();
        snapshot.units[0].name = "precious".to_string();
        {
            let conn = open_db(&config().db_path).unwrap();
            SqliteSnapshotRepository::try_new(&conn)
                .unwrap()
                .save(&snapshot)
                .unwrap();
        }

        let found = search_units("1".to_string());
        assert!(!found.ok);
        assert!(found.items.is_empty());
        assert!(found.message.contains("corrupt snapshot"), "{}", found.message);

        let stats = stats_summary();
        assert!(!stats.ok);
        assert!(stats.message.contains("reset_corrupt_store"), "{}", stats.message);

        assert!(!record_read("1".to_string(), "book".to_string()).ok);
        assert!(!heat_map().ok);

        let status = store_status();
        assert!(status.corrupt, "{}", status.message);

        {
            let conn = open_db(&config().db_path).unwrap();
            let stored = SqliteSnapshotRepository::try_new(&conn)
                .unwrap()
                .load()
                .unwrap()
                .unwrap();
            assert_eq!(stored.units.len(), UNIT_COUNT - 1);
            assert_eq!(stored.units[0].name, "precious");
        }

        let reset = reset_corrupt_store();
        assert!(reset.ok && reset.reset, "{}", reset.message);
        assert!(reset.message.contains("239"), "{}", reset.message);

        let again = reset_corrupt_store();
        assert!(again.ok, "{}", again.message);
        assert!(!again.reset);

        let status = store_status();
        assert!(status.ok && !status.corrupt, "{}", status.message);
        assert_eq!(units_by_recency().items.len(), UNIT_COUNT);
    }
}
