//! Unit store: owner of the fixed unit collection.
//!
//! # Responsibility
//! - Create the collection from a persisted snapshot or from scratch.
//! - Look units up by id or by user-entered identifier.
//! - Rename units and prepend read events, persisting after each change.
//!
//! # Invariants
//! - The collection always holds exactly `UNIT_COUNT` units, id `k` at
//!   position `k - 1`.
//! - A failed save leaves the in-memory collection unchanged.
//! - Falling back to a fresh collection after a corrupt snapshot only
//!   happens through `open_or_reset`, which reports it.

use crate::model::snapshot::{Snapshot, SnapshotError};
use crate::model::unit::{fresh_units, ReadEvent, Unit, UnitId};
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Recoverable store errors; none of them leave partial writes behind.
#[derive(Debug)]
pub enum StoreError {
    /// Unit id outside `1..=UNIT_COUNT`.
    OutOfRange(u32),
    /// Identifier matched neither an id nor a unit name.
    NotFound(String),
    /// Identifier was blank after trimming.
    EmptyIdentifier,
    CorruptSnapshot(SnapshotError),
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange(id) => write!(f, "unit id {id} is out of range"),
            Self::NotFound(identifier) => write!(f, "no unit matches `{identifier}`"),
            Self::EmptyIdentifier => write!(f, "unit identifier is empty"),
            Self::CorruptSnapshot(err) => write!(f, "corrupt snapshot: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CorruptSnapshot(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Snapshot(err) => Self::CorruptSnapshot(err),
            other => Self::Repo(other),
        }
    }
}

impl From<SnapshotError> for StoreError {
    fn from(value: SnapshotError) -> Self {
        Self::CorruptSnapshot(value)
    }
}

/// How `open_or_reset` obtained its collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Restored,
    /// Nothing was stored; a fresh collection was saved.
    Fresh,
    /// Stored snapshot was unusable and has been overwritten.
    ResetAfterCorruption(SnapshotError),
}

/// Owner of the unit collection and its persistence handle.
pub struct UnitStore<R: SnapshotRepository> {
    repo: R,
    units: Vec<Unit>,
}

impl<R: SnapshotRepository> UnitStore<R> {
    /// Loads the stored snapshot, or creates and saves a fresh collection.
    ///
    /// # Errors
    /// - `CorruptSnapshot` when the stored blob has the wrong shape.
    /// - `Repo` when the backend fails.
    pub fn initialize(repo: R) -> StoreResult<Self> {
        let persisted = repo.load()?;
        Self::from_snapshot(repo, persisted)
    }

    /// Builds the store from an already loaded snapshot.
    ///
    /// `None` creates the fresh collection and persists it immediately.
    pub fn from_snapshot(repo: R, persisted: Option<Snapshot>) -> StoreResult<Self> {
        match persisted {
            Some(snapshot) => {
                let units = snapshot.into_units()?;
                info!("event=store_init module=store status=ok source=restored");
                Ok(Self { repo, units })
            }
            None => Self::fresh(repo),
        }
    }

    /// Like [`UnitStore::initialize`], but replaces a corrupt snapshot with a
    /// fresh collection and reports that it did so.
    pub fn open_or_reset(repo: R) -> StoreResult<(Self, InitOutcome)> {
        let corruption = match repo.load() {
            Ok(None) => return Ok((Self::fresh(repo)?, InitOutcome::Fresh)),
            Ok(Some(snapshot)) => match snapshot.into_units() {
                Ok(units) => {
                    info!("event=store_init module=store status=ok source=restored");
                    return Ok((Self { repo, units }, InitOutcome::Restored));
                }
                Err(err) => err,
            },
            Err(RepoError::Snapshot(err)) => err,
            Err(err) => return Err(err.into()),
        };

        warn!("event=snapshot_reset module=store status=warn reason={corruption}");
        let store = Self::fresh(repo)?;
        Ok((store, InitOutcome::ResetAfterCorruption(corruption)))
    }

    fn fresh(repo: R) -> StoreResult<Self> {
        let store = Self {
            repo,
            units: fresh_units(),
        };
        store.persist()?;
        info!("event=store_init module=store status=ok source=fresh");
        Ok(store)
    }

    /// All units in id order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Unit for an already validated id.
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.to_index()]
    }

    /// # Errors
    /// - `OutOfRange` when `id` is not in `1..=UNIT_COUNT`.
    pub fn get_unit(&self, id: u32) -> StoreResult<&Unit> {
        let id = UnitId::new(id).ok_or(StoreError::OutOfRange(id))?;
        Ok(self.unit(id))
    }

    /// Sets a unit name, trimmed; an empty result clears it.
    pub fn rename(&mut self, id: u32, new_name: &str) -> StoreResult<()> {
        let id = UnitId::new(id).ok_or(StoreError::OutOfRange(id))?;
        let index = id.to_index();
        let previous = self.units[index].set_name(new_name.trim().to_string());

        if let Err(err) = self.persist() {
            self.units[index].set_name(previous);
            return Err(err);
        }

        info!(
            "event=unit_renamed module=store status=ok unit_id={id} named={}",
            self.units[index].is_named()
        );
        Ok(())
    }

    /// Resolves user input: exact id text first, then case-insensitive
    /// exact name.
    ///
    /// # Errors
    /// - `EmptyIdentifier` for blank input.
    /// - `NotFound` when nothing matches.
    pub fn resolve_by_identifier(&self, text: &str) -> StoreResult<&Unit> {
        let needle = text.trim();
        if needle.is_empty() {
            return Err(StoreError::EmptyIdentifier);
        }

        if let Some(unit) = self
            .units
            .iter()
            .find(|unit| unit.id().to_string() == needle)
        {
            return Ok(unit);
        }

        let needle_lower = needle.to_lowercase();
        self.units
            .iter()
            .find(|unit| unit.is_named() && unit.name().to_lowercase() == needle_lower)
            .ok_or_else(|| StoreError::NotFound(needle.to_string()))
    }

    /// Current state as a persistable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_units(&self.units)
    }

    pub(crate) fn prepend_event(&mut self, id: UnitId, event: ReadEvent) -> StoreResult<()> {
        let index = id.to_index();
        self.units[index].prepend(event);

        if let Err(err) = self.persist() {
            self.units[index].drop_latest();
            return Err(err);
        }
        Ok(())
    }

    fn persist(&self) -> StoreResult<()> {
        self.repo.save(&self.snapshot()).map_err(|err| {
            warn!("event=snapshot_save module=store status=error error={err}");
            StoreError::from(err)
        })
    }
}
