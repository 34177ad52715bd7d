//! Calendar heat map over a trailing window.
//!
//! # Invariants
//! - The grid is always `HEAT_MAP_WEEKS * DAYS_PER_WEEK` cells.
//! - Cell `index = week * 7 + day` covers `reference - (365 - index)` days,
//!   so the last five cells fall after the reference day and stay empty
//!   unless events carry future timestamps.

use chrono::{NaiveDate, TimeDelta};
use std::collections::BTreeMap;

pub const HEAT_MAP_WEEKS: usize = 53;
pub const DAYS_PER_WEEK: usize = 7;
pub const HEAT_MAP_CELLS: usize = HEAT_MAP_WEEKS * DAYS_PER_WEEK;

/// Lookback anchoring cell 0; the reference day sits at this index.
pub const LOOKBACK_DAYS: usize = 365;

/// Five-step activity level of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Intensity {
    None,
    Level1,
    Level2,
    /// 3 to 5 events.
    Level3,
    /// 6 or more events.
    Level4,
}

impl Intensity {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::None,
            1 => Self::Level1,
            2 => Self::Level2,
            3..=5 => Self::Level3,
            _ => Self::Level4,
        }
    }

    /// Numeric level, 0 for no activity.
    pub fn level(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Level1 => 1,
            Self::Level2 => 2,
            Self::Level3 => 3,
            Self::Level4 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatCell {
    pub date: NaiveDate,
    pub count: usize,
    pub intensity: Intensity,
}

/// Week-major grid of day cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatMap {
    cells: Vec<HeatCell>,
}

impl HeatMap {
    /// Builds the grid ending around `reference` from per-day counts.
    pub fn build(reference: NaiveDate, daily_counts: &BTreeMap<NaiveDate, usize>) -> Self {
        let cells = (0..HEAT_MAP_CELLS)
            .map(|index| {
                let date = cell_date(reference, index);
                let count = daily_counts.get(&date).copied().unwrap_or(0);
                HeatCell {
                    date,
                    count,
                    intensity: Intensity::from_count(count),
                }
            })
            .collect();
        Self { cells }
    }

    /// All cells in index order.
    pub fn cells(&self) -> &[HeatCell] {
        &self.cells
    }

    pub fn cell(&self, week: usize, day: usize) -> Option<&HeatCell> {
        if week >= HEAT_MAP_WEEKS || day >= DAYS_PER_WEEK {
            return None;
        }
        self.cells.get(week * DAYS_PER_WEEK + day)
    }

    /// Cells grouped by week column.
    pub fn weeks(&self) -> impl Iterator<Item = &[HeatCell]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    /// Sum of all cell counts.
    pub fn total(&self) -> usize {
        self.cells.iter().map(|cell| cell.count).sum()
    }
}

fn cell_date(reference: NaiveDate, index: usize) -> NaiveDate {
    let offset = index as i64 - LOOKBACK_DAYS as i64;
    reference + TimeDelta::days(offset)
}
