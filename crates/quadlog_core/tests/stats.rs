use chrono::{FixedOffset, NaiveDate, TimeDelta, TimeZone, Utc};
use quadlog_core::stats::heat_map::{HEAT_MAP_CELLS, HEAT_MAP_WEEKS};
use quadlog_core::{
    Clock, EventRecorder, FixedClock, Intensity, MemorySnapshotRepository, ReadKind,
    StatsAggregator, UnitStore,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn summarize_empty_store() {
    let repo = MemorySnapshotRepository::new();
    let clock = FixedClock::at(Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap());
    let store = UnitStore::initialize(&repo).unwrap();

    let stats = StatsAggregator::new(store.units(), &clock).summarize();
    assert_eq!(stats.total_events, 0);
    assert_eq!(stats.units_touched, 0);
    assert_eq!(stats.active_day_count, 0);
    assert_eq!(stats.completion_percent, 0.0);
    assert_eq!(stats.average_per_active_day, 0.0);
}

#[test]
fn one_touched_unit_rounds_completion_to_one_decimal() {
    let repo = MemorySnapshotRepository::new();
    let clock = FixedClock::at(Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap());
    let mut store = UnitStore::initialize(&repo).unwrap();
    EventRecorder::new(&mut store, &clock)
        .record(1, ReadKind::Recitation)
        .unwrap();

    let stats = StatsAggregator::new(store.units(), &clock).summarize();
    assert_eq!(stats.completion_percent, 0.4);
    assert_eq!(stats.units_touched, 1);
    assert_eq!(stats.average_per_active_day, 1.0);
}

#[test]
fn summarize_partitions_counts_and_days() {
    let repo = MemorySnapshotRepository::new();
    let clock = FixedClock::at(Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap());
    let mut store = UnitStore::initialize(&repo).unwrap();
    store.rename(1, "Al-Fatiha").unwrap();
    store.rename(2, "Al-Baqarah").unwrap();
    {
        let mut recorder = EventRecorder::new(&mut store, &clock);
        recorder.record(1, ReadKind::Recitation).unwrap();
        recorder.record(1, ReadKind::Memorization).unwrap();
        recorder.record(3, ReadKind::Recitation).unwrap();
        clock.advance(TimeDelta::days(1));
        recorder.record(3, ReadKind::Recitation).unwrap();
        clock.advance(TimeDelta::days(2));
        recorder.record(4, ReadKind::Memorization).unwrap();
        recorder.record(5, ReadKind::Recitation).unwrap();
        recorder.record(6, ReadKind::Recitation).unwrap();
    }

    let aggregator = StatsAggregator::new(store.units(), &clock);
    let stats = aggregator.summarize();
    assert_eq!(stats.total_events, 7);
    assert_eq!(stats.recitation_count, 5);
    assert_eq!(stats.memorization_count, 2);
    assert_eq!(stats.units_touched, 5);
    assert_eq!(stats.named_units, 2);
    assert_eq!(stats.active_day_count, 3);
    assert_eq!(stats.completion_percent, 2.1);
    assert_eq!(stats.average_per_active_day, 2.3);

    assert_eq!(aggregator.summarize(), stats);

    let daily = aggregator.daily_counts();
    assert_eq!(daily.get(&date(2025, 6, 15)), Some(&3));
    assert_eq!(daily.get(&date(2025, 6, 16)), Some(&1));
    assert_eq!(daily.get(&date(2025, 6, 18)), Some(&3));
}

#[test]
fn heat_map_without_events_is_all_empty() {
    let repo = MemorySnapshotRepository::new();
    let clock = FixedClock::at(Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap());
    let store = UnitStore::initialize(&repo).unwrap();

    let map = StatsAggregator::new(store.units(), &clock).heat_map(clock.now());
    assert_eq!(map.cells().len(), HEAT_MAP_CELLS);
    assert_eq!(map.weeks().count(), HEAT_MAP_WEEKS);
    assert!(map
        .cells()
        .iter()
        .all(|cell| cell.count == 0 && cell.intensity == Intensity::None));
    assert_eq!(map.total(), 0);
}

#[test]
fn three_events_on_one_day_land_in_level_three() {
    let repo = MemorySnapshotRepository::new();
    let clock = FixedClock::at(Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap());
    let mut store = UnitStore::initialize(&repo).unwrap();
    {
        let mut recorder = EventRecorder::new(&mut store, &clock);
        for _ in 0..3 {
            recorder.record(7, ReadKind::Recitation).unwrap();
            clock.advance(TimeDelta::hours(2));
        }
    }

    let map = StatsAggregator::new(store.units(), &clock).heat_map(clock.now());
    let today = map.cell(52, 1).unwrap();
    assert_eq!(today.date, date(2025, 6, 15));
    assert_eq!(today.count, 3);
    assert_eq!(today.intensity, Intensity::Level3);
    assert_eq!(today.intensity.level(), 3);
    assert_eq!(map.total(), 3);
}

#[test]
fn heat_map_cells_follow_the_lookback_formula() {
    let repo = MemorySnapshotRepository::new();
    let reference = Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap();
    let clock = FixedClock::at(reference - TimeDelta::days(365));
    let mut store = UnitStore::initialize(&repo).unwrap();
    {
        let mut recorder = EventRecorder::new(&mut store, &clock);
        recorder.record(1, ReadKind::Recitation).unwrap();
        clock.set(reference - TimeDelta::days(366));
        recorder.record(2, ReadKind::Recitation).unwrap();
        clock.set(reference - TimeDelta::days(10));
        for unit_id in 10..16 {
            recorder.record(unit_id, ReadKind::Memorization).unwrap();
        }
    }

    let map = StatsAggregator::new(store.units(), &clock).heat_map(reference);
    let first = map.cell(0, 0).unwrap();
    assert_eq!(first.date, date(2024, 6, 15));
    assert_eq!(first.count, 1);
    assert_eq!(first.intensity, Intensity::Level1);

    // index 355 = week 50, day 5
    let busy = map.cell(50, 5).unwrap();
    assert_eq!(busy.date, date(2025, 6, 5));
    assert_eq!(busy.count, 6);
    assert_eq!(busy.intensity, Intensity::Level4);

    let last = map.cell(52, 6).unwrap();
    assert_eq!(last.date, date(2025, 6, 20));
    assert!(map.cell(53, 0).is_none());
    assert!(map.cell(0, 7).is_none());
    assert_eq!(map.total(), 7);
}

#[test]
fn day_buckets_follow_the_clock_offset() {
    let repo = MemorySnapshotRepository::new();
    let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
    let clock = FixedClock::with_offset(
        Utc.with_ymd_and_hms(2025, 6, 14, 22, 0, 0).unwrap(),
        plus_three,
    );
    let mut store = UnitStore::initialize(&repo).unwrap();
    EventRecorder::new(&mut store, &clock)
        .record(1, ReadKind::Recitation)
        .unwrap();

    let daily = StatsAggregator::new(store.units(), &clock).daily_counts();
    assert_eq!(daily.get(&date(2025, 6, 15)), Some(&1));
    assert_eq!(daily.get(&date(2025, 6, 14)), None);
}
