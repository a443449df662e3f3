//! Event sets: ordered hazard events plus session attributes

use crate::error::Result;
use crate::time::{from_epoch_millis, to_epoch_millis, Instant};
use crate::{EventId, HazardEvent, HazardEventView, Value, ValueMap};
use serde::{Deserialize, Serialize};

/// Session attribute: current time, epoch ms
pub const CURRENT_TIME: &str = "currentTime";
/// Session attribute: site the session runs for
pub const SITE_ID: &str = "siteID";
/// Session attribute: hazard mode of the session
pub const HAZARD_MODE: &str = "hazardMode";
/// Session attribute: trigger that caused the invocation
pub const TRIGGER: &str = "trigger";
/// Session attribute: identifiers of whatever fired the trigger
pub const TRIGGER_IDENTIFIERS: &str = "eventIdentifiers";
/// Session and result attribute: forecaster's selected time, epoch ms
pub const SELECTED_TIME: &str = "selectedTime";

/// Result flag: persist each event as a new history entry
pub const SAVE_TO_HISTORY: &str = "saveToHistory";
/// Result flag: update the working copy without a history entry
pub const SAVE_TO_DATABASE: &str = "saveToDatabase";
/// Result flag: keep this workstation's lock after saving
pub const KEEP_SAVED_TO_DATABASE_LOCKED: &str = "keepSavedToDatabaseLocked";

/// An ordered collection of hazard events plus session attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSet {
    events: Vec<HazardEvent>,
    attributes: ValueMap,
}

impl EventSet {
    /// Create an empty event set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from events
    pub fn from_events(events: impl IntoIterator<Item = HazardEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            attributes: ValueMap::new(),
        }
    }

    pub fn add(&mut self, event: HazardEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[HazardEvent] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut [HazardEvent] {
        &mut self.events
    }

    pub fn into_events(self) -> Vec<HazardEvent> {
        self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &HazardEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Find an event by ID
    pub fn find(&self, id: &EventId) -> Option<&HazardEvent> {
        self.events.iter().find(|e| e.event_id() == Some(id))
    }

    // === Attributes ===

    pub fn attributes(&self) -> &ValueMap {
        &self.attributes
    }

    pub fn get_attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Current time from the session attributes
    pub fn current_time(&self) -> Option<Instant> {
        self.time_attribute(CURRENT_TIME)
    }

    pub fn set_current_time(&mut self, t: Instant) {
        self.add_attribute(CURRENT_TIME, to_epoch_millis(t));
    }

    pub fn site_id(&self) -> Option<&str> {
        self.get_attribute(SITE_ID).and_then(Value::as_str)
    }

    pub fn trigger_identifiers(&self) -> Vec<String> {
        self.get_attribute(TRIGGER_IDENTIFIERS)
            .map(Value::as_string_list)
            .unwrap_or_default()
    }

    // === Result flags ===

    pub fn save_to_history(&self) -> bool {
        self.flag(SAVE_TO_HISTORY)
    }

    pub fn set_save_to_history(&mut self, on: bool) {
        self.add_attribute(SAVE_TO_HISTORY, on);
    }

    pub fn save_to_database(&self) -> bool {
        self.flag(SAVE_TO_DATABASE)
    }

    pub fn set_save_to_database(&mut self, on: bool) {
        self.add_attribute(SAVE_TO_DATABASE, on);
    }

    pub fn keep_saved_to_database_locked(&self) -> bool {
        self.flag(KEEP_SAVED_TO_DATABASE_LOCKED)
    }

    pub fn set_keep_saved_to_database_locked(&mut self, on: bool) {
        self.add_attribute(KEEP_SAVED_TO_DATABASE_LOCKED, on);
    }

    /// Time the result asks the cursor to move to
    pub fn selected_time(&self) -> Option<Instant> {
        self.time_attribute(SELECTED_TIME)
    }

    pub fn set_selected_time(&mut self, t: Instant) {
        self.add_attribute(SELECTED_TIME, to_epoch_millis(t));
    }

    /// True when no result flag is present
    pub fn has_no_flags(&self) -> bool {
        [
            SAVE_TO_HISTORY,
            SAVE_TO_DATABASE,
            KEEP_SAVED_TO_DATABASE_LOCKED,
            SELECTED_TIME,
        ]
        .iter()
        .all(|k| !self.attributes.contains_key(*k))
    }

    fn flag(&self, key: &str) -> bool {
        self.get_attribute(key).is_some_and(Value::is_truthy)
    }

    fn time_attribute(&self, key: &str) -> Option<Instant> {
        self.get_attribute(key)
            .and_then(Value::as_int)
            .and_then(|ms| from_epoch_millis(ms).ok())
    }

    /// Read a time attribute, surfacing malformed values
    pub fn require_time(&self, key: &str) -> Result<Option<Instant>> {
        match self.get_attribute(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => {
                let ms = v.as_int().ok_or_else(|| crate::Error::TypeError {
                    expected: "epoch milliseconds".to_string(),
                    got: v.type_name().to_string(),
                })?;
                from_epoch_millis(ms).map(Some)
            }
        }
    }
}

impl IntoIterator for EventSet {
    type Item = HazardEvent;
    type IntoIter = std::vec::IntoIter<HazardEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl FromIterator<HazardEvent> for EventSet {
    fn from_iter<I: IntoIterator<Item = HazardEvent>>(iter: I) -> Self {
        Self::from_events(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SiteId;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_flags() {
        let mut set = EventSet::new();
        assert!(set.has_no_flags());
        set.set_save_to_history(true);
        set.set_keep_saved_to_database_locked(false);
        assert!(set.save_to_history());
        assert!(!set.save_to_database());
        assert!(!set.keep_saved_to_database_locked());
        assert!(!set.has_no_flags());
    }

    #[test]
    fn test_time_attributes() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut set = EventSet::new();
        set.set_current_time(t);
        assert_eq!(set.current_time(), Some(t));
        assert_eq!(set.get_attribute(CURRENT_TIME), Some(&Value::Int(1_714_564_800_000)));

        set.add_attribute(SELECTED_TIME, "noon");
        assert!(set.require_time(SELECTED_TIME).is_err());
    }

    #[test]
    fn test_find() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut e = HazardEvent::new(SiteId::new("OAX").unwrap(), t);
        e.set_event_id(EventId::new("OAX-2024-000001")).unwrap();
        let set: EventSet = vec![e].into_iter().collect();
        assert!(set.find(&EventId::new("OAX-2024-000001")).is_some());
        assert!(set.find(&EventId::new("OAX-2024-000002")).is_none());
    }
}
