//! Event recorder: the only writer of unit read logs.
//!
//! # Invariants
//! - New events are prepended, never inserted elsewhere.
//! - Timestamps come from the injected clock.
//! - Prior events are never overwritten or removed.

use crate::clock::Clock;
use crate::model::unit::{ReadEvent, ReadKind, UnitId};
use crate::repo::snapshot_repo::SnapshotRepository;
use crate::service::unit_store::{StoreError, StoreResult, UnitStore};
use log::info;

/// Appends read events to a borrowed store.
pub struct EventRecorder<'a, R: SnapshotRepository> {
    store: &'a mut UnitStore<R>,
    clock: &'a dyn Clock,
}

impl<'a, R: SnapshotRepository> EventRecorder<'a, R> {
    pub fn new(store: &'a mut UnitStore<R>, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Records one completion of `unit_id` stamped with `clock.now()`.
    ///
    /// # Errors
    /// - `OutOfRange` for an invalid id.
    /// - `Repo` when persisting fails; the event is not kept.
    pub fn record(&mut self, unit_id: u32, kind: ReadKind) -> StoreResult<ReadEvent> {
        let id = UnitId::new(unit_id).ok_or(StoreError::OutOfRange(unit_id))?;
        self.record_for(id, kind)
    }

    /// Resolves `text` like [`UnitStore::resolve_by_identifier`], then records.
    pub fn record_by_identifier(
        &mut self,
        text: &str,
        kind: ReadKind,
    ) -> StoreResult<(UnitId, ReadEvent)> {
        let id = self.store.resolve_by_identifier(text)?.id();
        let event = self.record_for(id, kind)?;
        Ok((id, event))
    }

    fn record_for(&mut self, id: UnitId, kind: ReadKind) -> StoreResult<ReadEvent> {
        let event = ReadEvent::new(kind, self.clock.now());
        self.store.prepend_event(id, event)?;
        info!(
            "event=read_recorded module=recorder status=ok unit_id={id} kind={}",
            kind.as_str()
        );
        Ok(event)
    }
}
