//! Storage for the hazard events of one session
//!
//! Keeps three views of each event:
//! - the working copy the session edits
//! - the saved copy (database state)
//! - the history list (one entry per issuance-style save)

use crate::error::{Error, Result};
use crate::{EventId, HazardEvent, HazardEventView, HazardStatus, HazardType, SiteId};
use chrono::Datelike;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Hazard events of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardEventStore {
    site_id: SiteId,
    /// Working copies by ID
    events: IndexMap<EventId, HazardEvent>,
    /// Saved copies by ID
    saved: IndexMap<EventId, HazardEvent>,
    /// History entries by ID, oldest first
    history: IndexMap<EventId, Vec<HazardEvent>>,
    /// Next serial number to assign
    next_serial: u64,
}

impl HazardEventStore {
    /// Create an empty store for a site
    pub fn new(site_id: SiteId) -> Self {
        Self {
            site_id,
            events: IndexMap::new(),
            saved: IndexMap::new(),
            history: IndexMap::new(),
            next_serial: 1,
        }
    }

    pub fn site_id(&self) -> &SiteId {
        &self.site_id
    }

    /// Issue a fresh event ID, skipping IDs already in the session
    pub fn issue_event_id(&mut self, year: i32) -> EventId {
        loop {
            let id = EventId::from_parts(&self.site_id, year, self.next_serial);
            self.next_serial += 1;
            if !self.events.contains_key(&id) {
                return id;
            }
        }
    }

    /// Add an event, assigning an ID if it has none
    ///
    /// Fails if an event with the same ID is already present.
    pub fn insert(&mut self, mut event: HazardEvent) -> Result<EventId> {
        let id = match event.event_id() {
            Some(id) => id.clone(),
            None => {
                let id = self.issue_event_id(event.creation_time().year());
                event.set_event_id(id.clone())?;
                id
            }
        };
        if self.events.contains_key(&id) {
            return Err(Error::InvalidOperation(format!("duplicate event ID: {}", id)));
        }
        self.events.insert(id.clone(), event);
        Ok(id)
    }

    /// Replace the working copy of an existing event
    ///
    /// The new copy must be a legal successor of the current one (see
    /// [`HazardEvent::check_replacement`]) and keeps its issuance history.
    pub fn replace(&mut self, mut event: HazardEvent) -> Result<()> {
        let id = event
            .event_id()
            .cloned()
            .ok_or_else(|| Error::InvalidOperation("event has no ID".to_string()))?;
        let slot = self
            .events
            .get_mut(&id)
            .ok_or_else(|| Error::EventNotFound(id.to_string()))?;
        slot.check_replacement(&event)?;
        event.inherit_issuance(slot);
        *slot = event;
        Ok(())
    }

    /// Get an event by ID
    pub fn get(&self, id: &EventId) -> Option<&HazardEvent> {
        self.events.get(id)
    }

    /// Get a mutable reference to an event
    pub fn get_mut(&mut self, id: &EventId) -> Option<&mut HazardEvent> {
        self.events.get_mut(id)
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.events.contains_key(id)
    }

    /// Remove an event from the session (saved copy and history stay)
    pub fn remove(&mut self, id: &EventId) -> Option<HazardEvent> {
        self.events.shift_remove(id)
    }

    /// Copy the working copy over the saved copy
    pub fn save_to_database(&mut self, id: &EventId) -> Result<()> {
        let event = self
            .events
            .get(id)
            .ok_or_else(|| Error::EventNotFound(id.to_string()))?;
        self.saved.insert(id.clone(), event.clone());
        Ok(())
    }

    /// Append the working copy to the history list and save it
    pub fn save_to_history(&mut self, id: &EventId) -> Result<()> {
        self.save_to_database(id)?;
        if let Some(event) = self.events.get(id) {
            self.history.entry(id.clone()).or_default().push(event.clone());
        }
        Ok(())
    }

    pub fn saved(&self, id: &EventId) -> Option<&HazardEvent> {
        self.saved.get(id)
    }

    pub fn history(&self, id: &EventId) -> &[HazardEvent] {
        self.history.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get all events with a given status
    pub fn by_status(&self, status: HazardStatus) -> impl Iterator<Item = &HazardEvent> {
        self.events.values().filter(move |e| e.status() == status)
    }

    /// Get all events of a hazard type (subtype must match too)
    pub fn by_hazard_type<'a>(&'a self, hazard_type: &'a HazardType) -> impl Iterator<Item = &'a HazardEvent> {
        self.events
            .values()
            .filter(move |e| e.hazard_type() == Some(hazard_type))
    }

    pub fn ids(&self) -> impl Iterator<Item = &EventId> {
        self.events.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HazardEvent> {
        self.events.values()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn store() -> HazardEventStore {
        HazardEventStore::new(SiteId::new("OAX").unwrap())
    }

    fn event() -> HazardEvent {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        HazardEvent::new(SiteId::new("OAX").unwrap(), t).with_hazard_type(HazardType::new("FA", "Y"))
    }

    #[test]
    fn test_insert_assigns_ids() {
        let mut store = store();
        let a = store.insert(event()).unwrap();
        let b = store.insert(event()).unwrap();
        assert_eq!(a.as_str(), "OAX-2024-000001");
        assert_eq!(b.as_str(), "OAX-2024-000002");
        assert_eq!(store.get(&a).unwrap().event_id(), Some(&a));
        assert_eq!(store.by_hazard_type(&HazardType::new("FA", "Y")).count(), 2);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut store = store();
        let id = store.insert(event()).unwrap();
        let copy = store.get(&id).unwrap().clone();
        assert!(store.insert(copy).is_err());
    }

    #[test]
    fn test_history_and_saved_copies() {
        let mut store = store();
        let id = store.insert(event()).unwrap();
        store.save_to_history(&id).unwrap();
        store.get_mut(&id).unwrap().set("note", "edited");
        store.save_to_database(&id).unwrap();

        assert_eq!(store.history(&id).len(), 1);
        assert!(store.history(&id)[0].get("note").is_none());
        assert!(store.saved(&id).unwrap().get("note").is_some());
        assert!(store.save_to_database(&EventId::new("missing")).is_err());
    }

    #[test]
    fn test_replace_requires_existing() {
        let mut store = store();
        let mut e = event();
        e.set_event_id(EventId::new("OAX-2024-000099")).unwrap();
        assert!(matches!(store.replace(e), Err(Error::EventNotFound(_))));
    }

    #[test]
    fn test_replace_cannot_reopen_ended_event() {
        let mut store = store();
        let id = store.insert(event()).unwrap();
        let stored = store.get_mut(&id).unwrap();
        stored.set_status(HazardStatus::Issued).unwrap();
        stored.set_status(HazardStatus::Ended).unwrap();

        let mut fresh = event();
        fresh.set_event_id(id.clone()).unwrap();
        assert!(matches!(
            store.replace(fresh),
            Err(Error::InvalidStatusTransition { .. })
        ));
        assert_eq!(store.get(&id).unwrap().status(), HazardStatus::Ended);
        assert!(store.get(&id).unwrap().ever_issued());
    }

    #[test]
    fn test_issued_ids_skip_explicit_ones() {
        let mut store = store();
        let mut explicit = event();
        explicit.set_event_id(EventId::new("OAX-2024-000001")).unwrap();
        store.insert(explicit).unwrap();
        let issued = store.insert(event()).unwrap();
        assert_eq!(issued.as_str(), "OAX-2024-000002");
    }
}
