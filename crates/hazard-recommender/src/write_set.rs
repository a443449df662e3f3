//! Deferred writes of a recommender result
//!
//! A result event set is turned into a `WriteSet` first. Every write is
//! checked against the store and the lock service before any of them is
//! applied, so a bad result leaves the session untouched.

use crate::error::{Error, Result};
use hazard_core::{EventId, HazardEvent, HazardEventStore, HazardEventView, HazardStatus, LockService};
use std::collections::HashSet;

/// A pending write to the event store
#[derive(Debug, Clone)]
pub enum PendingWrite {
    /// A new event; the store issues its ID
    Insert(HazardEvent),
    /// A new working copy of an existing event
    Replace(EventId, HazardEvent),
}

/// Writes collected from one result, applied all at once
#[derive(Debug, Default)]
pub struct WriteSet {
    writes: Vec<PendingWrite>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect and check the writes for a result
    ///
    /// Events with an ID must already be in the store, appear once in the
    /// result, and not be locked by another workstation. Each must be a legal
    /// successor of the stored copy: statuses only move forward, and an
    /// ended or elapsed event keeps its window and geometry. New events are
    /// moved to `event_state` when one is given.
    pub fn collect(
        tool: &str,
        events: Vec<HazardEvent>,
        event_state: Option<HazardStatus>,
        store: &HazardEventStore,
        locks: &dyn LockService,
    ) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidResult {
            tool: tool.to_string(),
            reason,
        };
        let mut writes = Vec::with_capacity(events.len());
        let mut seen = HashSet::new();
        for mut event in events {
            match event.event_id().cloned() {
                Some(id) => {
                    let stored = store
                        .get(&id)
                        .ok_or_else(|| invalid(format!("unknown event {}", id)))?;
                    if !seen.insert(id.clone()) {
                        return Err(invalid(format!("event {} appears twice", id)));
                    }
                    if locks.is_locked(&id) {
                        return Err(hazard_core::Error::Locked {
                            event_id: id.to_string(),
                            holder: "another workstation".to_string(),
                        }
                        .into());
                    }
                    stored
                        .check_replacement(&event)
                        .map_err(|e| invalid(format!("event {}: {}", id, e)))?;
                    event.inherit_issuance(stored);
                    writes.push(PendingWrite::Replace(id, event));
                }
                None => {
                    if let Some(status) = event_state {
                        event.set_status(status)?;
                    }
                    writes.push(PendingWrite::Insert(event));
                }
            }
        }
        Ok(Self { writes })
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[PendingWrite] {
        &self.writes
    }

    /// Apply every write, returning the IDs of inserted and replaced events
    ///
    /// `collect` has already checked each write against the store, and new
    /// events get IDs the store has not used, so no write fails here.
    pub fn apply(self, store: &mut HazardEventStore) -> Result<(Vec<EventId>, Vec<EventId>)> {
        let mut created = Vec::new();
        let mut modified = Vec::new();
        for write in self.writes {
            match write {
                PendingWrite::Insert(event) => created.push(store.insert(event)?),
                PendingWrite::Replace(id, event) => {
                    store.replace(event)?;
                    modified.push(id);
                }
            }
        }
        Ok((created, modified))
    }
}
