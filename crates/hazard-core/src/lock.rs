//! Hazard event locks
//!
//! Locks are held per workstation. A workstation never sees its own locks
//! reported as locked; the lock table is the only source of truth.

use crate::error::{Error, Result};
use crate::EventId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifier of a forecaster workstation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkstationId(pub String);

impl WorkstationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for WorkstationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lock operations available to scripts
pub trait LockService {
    /// Locked by another workstation
    fn is_locked(&self, id: &EventId) -> bool;
    /// Acquire the lock; fails if another workstation holds it
    fn lock(&self, id: &EventId) -> Result<()>;
    /// Release this workstation's lock; fails if another workstation holds it
    fn unlock(&self, id: &EventId) -> Result<()>;
    /// Remove any lock, whoever holds it
    fn break_lock(&self, id: &EventId) -> Result<()>;
    /// Locks this workstation holds
    fn held_locks(&self) -> Vec<EventId>;
}

/// Lock table shared between workstations in one process
#[derive(Debug, Clone, Default)]
pub struct LockTable {
    holders: Arc<Mutex<HashMap<EventId, WorkstationId>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A workstation's view of this table
    pub fn for_workstation(&self, workstation: WorkstationId) -> InMemoryLockService {
        InMemoryLockService {
            table: self.clone(),
            workstation,
        }
    }

    fn holders(&self) -> MutexGuard<'_, HashMap<EventId, WorkstationId>> {
        // A poisoned table still holds consistent entries; each write is a single insert/remove.
        self.holders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// In-process [`LockService`] for one workstation
#[derive(Debug, Clone)]
pub struct InMemoryLockService {
    table: LockTable,
    workstation: WorkstationId,
}

impl InMemoryLockService {
    pub fn workstation(&self) -> &WorkstationId {
        &self.workstation
    }

    fn locked_error(id: &EventId, holder: &WorkstationId) -> Error {
        Error::Locked {
            event_id: id.to_string(),
            holder: holder.to_string(),
        }
    }
}

impl LockService for InMemoryLockService {
    fn is_locked(&self, id: &EventId) -> bool {
        self.table
            .holders()
            .get(id)
            .is_some_and(|holder| *holder != self.workstation)
    }

    fn lock(&self, id: &EventId) -> Result<()> {
        let mut holders = self.table.holders();
        match holders.get(id) {
            Some(holder) if *holder != self.workstation => Err(Self::locked_error(id, holder)),
            _ => {
                holders.insert(id.clone(), self.workstation.clone());
                Ok(())
            }
        }
    }

    fn unlock(&self, id: &EventId) -> Result<()> {
        let mut holders = self.table.holders();
        match holders.get(id) {
            Some(holder) if *holder != self.workstation => Err(Self::locked_error(id, holder)),
            Some(_) => {
                holders.remove(id);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn break_lock(&self, id: &EventId) -> Result<()> {
        if let Some(holder) = self.table.holders().remove(id) {
            log::warn!("{} broke lock on {} held by {}", self.workstation, id, holder);
        }
        Ok(())
    }

    fn held_locks(&self) -> Vec<EventId> {
        let mut held: Vec<EventId> = self
            .table
            .holders()
            .iter()
            .filter(|(_, holder)| **holder == self.workstation)
            .map(|(id, _)| id.clone())
            .collect();
        held.sort();
        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_locks_not_reported() {
        let table = LockTable::new();
        let a = table.for_workstation(WorkstationId::new("ws-a"));
        let b = table.for_workstation(WorkstationId::new("ws-b"));
        let id = EventId::new("OAX-2024-000001");

        a.lock(&id).unwrap();
        assert!(!a.is_locked(&id));
        assert!(b.is_locked(&id));
        assert_eq!(a.held_locks(), vec![id.clone()]);
    }

    #[test]
    fn test_contention() {
        let table = LockTable::new();
        let a = table.for_workstation(WorkstationId::new("ws-a"));
        let b = table.for_workstation(WorkstationId::new("ws-b"));
        let id = EventId::new("OAX-2024-000001");

        a.lock(&id).unwrap();
        assert!(matches!(b.lock(&id), Err(Error::Locked { .. })));
        assert!(b.unlock(&id).is_err());

        b.break_lock(&id).unwrap();
        assert!(!b.is_locked(&id));
        b.lock(&id).unwrap();
        assert!(a.is_locked(&id));
        b.unlock(&id).unwrap();
        assert!(!a.is_locked(&id));
    }
}
