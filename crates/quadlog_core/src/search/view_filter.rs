//! Filtered and sorted projections of the unit collection.
//!
//! # Responsibility
//! - Recent activity: one row per touched unit, filtered and capped.
//! - Recency grid: every unit, touched units first.
//! - Free-text unit search and per-unit history.
//!
//! # Invariants
//! - A unit's representative event is always `events[0]`.
//! - Sorting is stable, so ties keep ascending unit-id order.
//! - Projections never mutate the collection.

use crate::clock::Clock;
use crate::model::unit::{ReadEvent, ReadKind, Unit, UnitId};
use crate::service::unit_store::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

/// Maximum number of rows returned by [`ViewFilter::recent_activity`].
pub const RECENT_ACTIVITY_LIMIT: usize = 24;

/// Kind filter with an explicit "all" option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KindFilter {
    #[default]
    All,
    Only(ReadKind),
}

impl KindFilter {
    fn accepts(self, kind: ReadKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == kind,
        }
    }
}

/// Conjunctive filters for the recent-activity list.
///
/// Every field defaults to "no filtering".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilters {
    /// Keep units whose latest event falls on this calendar day.
    pub date: Option<NaiveDate>,
    pub kind: KindFilter,
    /// Substring of the unit id, or case-insensitive substring of the name.
    /// Empty disables the filter.
    pub text: String,
}

/// One row of the recent-activity list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySummary {
    pub unit_id: UnitId,
    pub unit_name: String,
    pub latest_kind: ReadKind,
    pub latest_timestamp: DateTime<Utc>,
}

/// One cell of the recency-ordered unit grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOverview {
    pub unit_id: UnitId,
    pub name: String,
    /// `None` when the unit has never been read.
    pub latest_timestamp: Option<DateTime<Utc>>,
    pub recitation_count: usize,
    pub memorization_count: usize,
}

/// Read-only view builder over a unit slice.
pub struct ViewFilter<'a> {
    units: &'a [Unit],
    clock: &'a dyn Clock,
}

impl<'a> ViewFilter<'a> {
    pub fn new(units: &'a [Unit], clock: &'a dyn Clock) -> Self {
        Self { units, clock }
    }

    /// Latest event per touched unit, filtered, newest first, capped at
    /// [`RECENT_ACTIVITY_LIMIT`]. Empty when nothing qualifies.
    pub fn recent_activity(&self, filters: &ActivityFilters) -> Vec<ActivitySummary> {
        let mut rows: Vec<ActivitySummary> = self
            .units
            .iter()
            .filter_map(|unit| {
                let latest = unit.latest()?;
                self.keeps(unit, latest, filters).then(|| ActivitySummary {
                    unit_id: unit.id(),
                    unit_name: unit.name().to_string(),
                    latest_kind: latest.kind,
                    latest_timestamp: latest.timestamp,
                })
            })
            .collect();

        rows.sort_by(|a, b| b.latest_timestamp.cmp(&a.latest_timestamp));
        rows.truncate(RECENT_ACTIVITY_LIMIT);
        rows
    }

    fn keeps(&self, unit: &Unit, latest: &ReadEvent, filters: &ActivityFilters) -> bool {
        if let Some(day) = filters.date {
            if self.clock.calendar_date(latest.timestamp) != day {
                return false;
            }
        }
        if !filters.kind.accepts(latest.kind) {
            return false;
        }
        filters.text.is_empty() || matches_text(unit, &filters.text)
    }

    /// Every unit: read units newest first, then unread units by id.
    pub fn all_units_by_recency(&self) -> Vec<UnitOverview> {
        let mut rows: Vec<UnitOverview> = self
            .units
            .iter()
            .map(|unit| UnitOverview {
                unit_id: unit.id(),
                name: unit.name().to_string(),
                latest_timestamp: unit.latest().map(|event| event.timestamp),
                recitation_count: unit.count_of(ReadKind::Recitation),
                memorization_count: unit.count_of(ReadKind::Memorization),
            })
            .collect();

        rows.sort_by(|a, b| match (a.latest_timestamp, b.latest_timestamp) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.unit_id.cmp(&b.unit_id),
        });
        rows
    }

    /// Units whose id text or name contains `term`, in id order.
    ///
    /// A blank term yields no results rather than every unit.
    pub fn search(&self, term: &str) -> Vec<&'a Unit> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        self.units
            .iter()
            .filter(|unit| matches_text(unit, term))
            .collect()
    }

    /// Events of one unit, newest first.
    pub fn unit_history(&self, id: u32) -> StoreResult<&'a [ReadEvent]> {
        let unit_id = UnitId::new(id).ok_or(StoreError::OutOfRange(id))?;
        self.units
            .get(unit_id.to_index())
            .map(Unit::events)
            .ok_or(StoreError::OutOfRange(id))
    }
}

fn matches_text(unit: &Unit, needle: &str) -> bool {
    unit.id().to_string().contains(needle)
        || unit.name().to_lowercase().contains(&needle.to_lowercase())
}
