//! Unit and read-event domain model.
//!
//! # Responsibility
//! - Define the unit record shared by store, filter and stats code.
//! - Own the id <-> position mapping used for constant-time lookup.
//!
//! # Invariants
//! - `UnitId` values are always inside `1..=UNIT_COUNT`.
//! - Unit id `k` lives at position `k - 1` of the collection.
//! - `Unit::events` is newest-first: index 0 is the latest append.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Number of units tracked by every store.
pub const UNIT_COUNT: usize = 240;

const MAX_UNIT_ID: u32 = UNIT_COUNT as u32;

/// Validated 1-based unit identifier.
///
/// Construction goes through [`UnitId::new`] or [`UnitId::from_index`], so
/// holding a `UnitId` is proof that it addresses an existing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(u32);

impl UnitId {
    /// Returns `None` when `value` is outside `1..=UNIT_COUNT`.
    pub fn new(value: u32) -> Option<Self> {
        (1..=MAX_UNIT_ID).contains(&value).then_some(Self(value))
    }

    /// Maps a 0-based collection position back to its id.
    pub fn from_index(index: usize) -> Option<Self> {
        if index < UNIT_COUNT {
            Some(Self(index as u32 + 1))
        } else {
            None
        }
    }

    /// Raw 1-based id value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// 0-based position of this unit inside the collection.
    pub fn to_index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Iterates every valid id in ascending order.
    pub fn all() -> impl Iterator<Item = UnitId> {
        (1..=MAX_UNIT_ID).map(Self)
    }
}

impl Display for UnitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mode a unit completion was logged under.
///
/// The stored form accepts the legacy `book`/`heart` spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadKind {
    /// Read from the text.
    #[serde(alias = "book")]
    Recitation,
    /// Recited from memory.
    #[serde(alias = "heart")]
    Memorization,
}

impl ReadKind {
    /// Stable wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recitation => "recitation",
            Self::Memorization => "memorization",
        }
    }

    /// Parses a wire label, case-insensitive, legacy spellings included.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recitation" | "book" => Some(Self::Recitation),
            "memorization" | "heart" => Some(Self::Memorization),
            _ => None,
        }
    }
}

/// One completion of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadEvent {
    #[serde(alias = "type")]
    pub kind: ReadKind,
    /// Assigned from the clock at record time, never user supplied.
    #[serde(alias = "date")]
    pub timestamp: DateTime<Utc>,
}

impl ReadEvent {
    pub fn new(kind: ReadKind, timestamp: DateTime<Utc>) -> Self {
        Self { kind, timestamp }
    }
}

/// One of the fixed segments being tracked.
///
/// Fields are private so the newest-first ordering can only be extended
/// through [`Unit::prepend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    id: UnitId,
    name: String,
    events: Vec<ReadEvent>,
}

impl Unit {
    /// Creates an unnamed unit with an empty log.
    pub fn new(id: UnitId) -> Self {
        Self {
            id,
            name: String::new(),
            events: Vec::new(),
        }
    }

    pub(crate) fn restore(id: UnitId, name: String, events: Vec<ReadEvent>) -> Self {
        Self { id, name, events }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Display label; empty means unnamed.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    /// Read events, newest first.
    pub fn events(&self) -> &[ReadEvent] {
        &self.events
    }

    /// Most recent event, if any.
    pub fn latest(&self) -> Option<&ReadEvent> {
        self.events.first()
    }

    /// Number of events logged under `kind`.
    pub fn count_of(&self, kind: ReadKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }

    pub(crate) fn set_name(&mut self, name: String) -> String {
        std::mem::replace(&mut self.name, name)
    }

    pub(crate) fn prepend(&mut self, event: ReadEvent) {
        self.events.insert(0, event);
    }

    pub(crate) fn drop_latest(&mut self) -> Option<ReadEvent> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }
}

/// Builds the fresh collection: every id, unnamed, no events.
pub fn fresh_units() -> Vec<Unit> {
    UnitId::all().map(Unit::new).collect()
}

#[cfg(test)]
mod tests {
    use super::{fresh_units, ReadEvent, ReadKind, Unit, UnitId, UNIT_COUNT};
    use chrono::{TimeZone, Utc};

    #[test]
    fn unit_id_rejects_zero_and_values_past_the_last_unit() {
        assert!(UnitId::new(0).is_none());
        assert!(UnitId::new(241).is_none());
        assert_eq!(UnitId::new(1).map(UnitId::get), Some(1));
        assert_eq!(UnitId::new(240).map(UnitId::get), Some(240));
    }

    #[test]
    fn index_mapping_is_offset_by_one_both_ways() {
        let first = UnitId::new(1).unwrap();
        let last = UnitId::new(240).unwrap();
        assert_eq!(first.to_index(), 0);
        assert_eq!(last.to_index(), 239);
        assert_eq!(UnitId::from_index(0), Some(first));
        assert_eq!(UnitId::from_index(239), Some(last));
        assert_eq!(UnitId::from_index(UNIT_COUNT), None);

        for id in UnitId::all() {
            assert_eq!(UnitId::from_index(id.to_index()), Some(id));
        }
    }

    #[test]
    fn fresh_units_are_dense_and_empty() {
        let units = fresh_units();
        assert_eq!(units.len(), UNIT_COUNT);
        for (position, unit) in units.iter().enumerate() {
            assert_eq!(unit.id().to_index(), position);
            assert!(!unit.is_named());
            assert!(unit.events().is_empty());
        }
    }

    #[test]
    fn read_kind_parse_accepts_legacy_labels() {
        assert_eq!(ReadKind::parse("book"), Some(ReadKind::Recitation));
        assert_eq!(ReadKind::parse(" HEART "), Some(ReadKind::Memorization));
        assert_eq!(ReadKind::parse("memorization"), Some(ReadKind::Memorization));
        assert_eq!(ReadKind::parse("listening"), None);
    }

    #[test]
    fn prepend_keeps_latest_at_front() {
        let mut unit = Unit::new(UnitId::new(3).unwrap());
        let older = ReadEvent::new(
            ReadKind::Recitation,
            Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
        );
        let newer = ReadEvent::new(
            ReadKind::Memorization,
            Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap(),
        );
        unit.prepend(older);
        unit.prepend(newer);

        assert_eq!(unit.latest(), Some(&newer));
        assert_eq!(unit.events(), &[newer, older]);
        assert_eq!(unit.count_of(ReadKind::Recitation), 1);
        assert_eq!(unit.drop_latest(), Some(newer));
        assert_eq!(unit.latest(), Some(&older));
    }
}
