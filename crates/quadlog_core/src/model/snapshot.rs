//! Persisted snapshot of the whole unit collection.
//!
//! # Responsibility
//! - Define the serialized shape written to the blob store.
//! - Convert between snapshots and the in-memory unit collection.
//! - Accept the legacy bare-array form (`reads`/`type`/`date` fields).
//!
//! # Invariants
//! - A snapshot only becomes units when it has exactly `UNIT_COUNT`
//!   records whose ids equal their 1-based position.
//! - Saving always writes the current `{"units": [...]}` shape.

use crate::model::unit::{fresh_units, ReadEvent, Unit, UnitId, UNIT_COUNT};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shape errors found while restoring a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Stored blob is not valid snapshot JSON.
    Decode(String),
    WrongUnitCount { found: usize },
    /// Record at `position` (0-based) does not carry id `position + 1`.
    IdMismatch { position: usize, found: u32 },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(message) => write!(f, "snapshot is not valid JSON: {message}"),
            Self::WrongUnitCount { found } => {
                write!(f, "snapshot has {found} units, expected {UNIT_COUNT}")
            }
            Self::IdMismatch { position, found } => write!(
                f,
                "snapshot unit at position {position} has id {found}, expected {}",
                position + 1
            ),
        }
    }
}

impl Error for SnapshotError {}

/// Serialized form of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, alias = "reads")]
    pub events: Vec<ReadEvent>,
}

/// Complete serialized state of the unit collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub units: Vec<UnitRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotWire {
    Current { units: Vec<UnitRecord> },
    Legacy(Vec<UnitRecord>),
}

impl Snapshot {
    /// Snapshot of a freshly initialized collection.
    pub fn fresh() -> Self {
        Self::from_units(&fresh_units())
    }

    pub fn from_units(units: &[Unit]) -> Self {
        Self {
            units: units
                .iter()
                .map(|unit| UnitRecord {
                    id: unit.id().get(),
                    name: unit.name().to_string(),
                    events: unit.events().to_vec(),
                })
                .collect(),
        }
    }

    /// Validates shape and rebuilds the unit collection.
    ///
    /// # Errors
    /// - `WrongUnitCount` when the record count is not `UNIT_COUNT`.
    /// - `IdMismatch` when a record id is not its 1-based position.
    pub fn into_units(self) -> Result<Vec<Unit>, SnapshotError> {
        if self.units.len() != UNIT_COUNT {
            return Err(SnapshotError::WrongUnitCount {
                found: self.units.len(),
            });
        }

        self.units
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                let id = UnitId::from_index(position)
                    .filter(|expected| expected.get() == record.id)
                    .ok_or(SnapshotError::IdMismatch {
                        position,
                        found: record.id,
                    })?;
                Ok(Unit::restore(id, record.name, record.events))
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes either the current or the legacy bare-array form.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let wire: SnapshotWire =
            serde_json::from_str(text).map_err(|err| SnapshotError::Decode(err.to_string()))?;
        let units = match wire {
            SnapshotWire::Current { units } | SnapshotWire::Legacy(units) => units,
        };
        Ok(Self { units })
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
