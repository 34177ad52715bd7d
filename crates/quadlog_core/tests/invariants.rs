use chrono::{TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use quadlog_core::{
    EventRecorder, FixedClock, MemorySnapshotRepository, ReadKind, Snapshot, StatsAggregator,
    UnitStore, UNIT_COUNT,
};

fn read_kind() -> impl Strategy<Value = ReadKind> {
    prop_oneof![Just(ReadKind::Recitation), Just(ReadKind::Memorization)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn events_stay_newest_first_and_ids_stay_dense(
        reads in prop::collection::vec((1u32..=240, read_kind(), 0i64..=720), 0..60)
    ) {
        let repo = MemorySnapshotRepository::new();
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let mut store = UnitStore::initialize(&repo).unwrap();
        {
            let mut recorder = EventRecorder::new(&mut store, &clock);
            for (unit_id, kind, gap_minutes) in &reads {
                clock.advance(TimeDelta::minutes(*gap_minutes));
                recorder.record(*unit_id, *kind).unwrap();
            }
        }

        prop_assert_eq!(store.units().len(), UNIT_COUNT);
        for (position, unit) in store.units().iter().enumerate() {
            prop_assert_eq!(unit.id().to_index(), position);
            for pair in unit.events().windows(2) {
                prop_assert!(pair[0].timestamp >= pair[1].timestamp);
            }
        }

        let restored = UnitStore::initialize(&repo).unwrap();
        prop_assert_eq!(restored.snapshot(), store.snapshot());

        let aggregator = StatsAggregator::new(store.units(), &clock);
        let stats = aggregator.summarize();
        prop_assert_eq!(stats.total_events, reads.len());
        prop_assert_eq!(stats.recitation_count + stats.memorization_count, reads.len());
        prop_assert_eq!(aggregator.summarize(), stats);
    }

    #[test]
    fn snapshot_json_round_trips(names in prop::collection::vec("[a-zA-Z -]{0,12}", UNIT_COUNT)) {
        let repo = MemorySnapshotRepository::new();
        let mut store = UnitStore::initialize(&repo).unwrap();
        for (index, name) in names.iter().enumerate() {
            store.rename(index as u32 + 1, name).unwrap();
        }

        let json = store.snapshot().to_json().unwrap();
        prop_assert_eq!(Snapshot::from_json(&json).unwrap(), store.snapshot());
    }
}
