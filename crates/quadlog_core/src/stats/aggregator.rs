//! Summary statistics over every logged read event.
//!
//! # Invariants
//! - Pure function of the unit slice and clock zone; repeated calls agree.
//! - Percentages and averages are rounded to one decimal place.

use crate::clock::Clock;
use crate::model::unit::{ReadKind, Unit, UNIT_COUNT};
use crate::stats::heat_map::HeatMap;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Counters shown on the statistics screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub total_events: usize,
    pub recitation_count: usize,
    pub memorization_count: usize,
    /// Units with at least one event.
    pub units_touched: usize,
    pub named_units: usize,
    /// Distinct calendar days with at least one event.
    pub active_day_count: usize,
    pub completion_percent: f64,
    /// `0.0` when there are no active days.
    pub average_per_active_day: f64,
}

pub struct StatsAggregator<'a> {
    units: &'a [Unit],
    clock: &'a dyn Clock,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(units: &'a [Unit], clock: &'a dyn Clock) -> Self {
        Self { units, clock }
    }

    pub fn summarize(&self) -> Stats {
        let mut stats = Stats {
            total_events: 0,
            recitation_count: 0,
            memorization_count: 0,
            units_touched: 0,
            named_units: 0,
            active_day_count: 0,
            completion_percent: 0.0,
            average_per_active_day: 0.0,
        };

        for unit in self.units {
            if unit.latest().is_some() {
                stats.units_touched += 1;
            }
            if unit.is_named() {
                stats.named_units += 1;
            }
            for event in unit.events() {
                stats.total_events += 1;
                match event.kind {
                    ReadKind::Recitation => stats.recitation_count += 1,
                    ReadKind::Memorization => stats.memorization_count += 1,
                }
            }
        }

        stats.active_day_count = self.daily_counts().len();
        stats.completion_percent =
            round_one_decimal(stats.units_touched as f64 / UNIT_COUNT as f64 * 100.0);
        if stats.active_day_count > 0 {
            stats.average_per_active_day =
                round_one_decimal(stats.total_events as f64 / stats.active_day_count as f64);
        }
        stats
    }

    /// Event count per local calendar day, days without events omitted.
    pub fn daily_counts(&self) -> BTreeMap<NaiveDate, usize> {
        let mut counts = BTreeMap::new();
        for event in self.units.iter().flat_map(Unit::events) {
            *counts
                .entry(self.clock.calendar_date(event.timestamp))
                .or_insert(0) += 1;
        }
        counts
    }

    /// Heat map of the trailing window ending at `reference`.
    pub fn heat_map(&self, reference: DateTime<Utc>) -> HeatMap {
        HeatMap::build(self.clock.calendar_date(reference), &self.daily_counts())
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
