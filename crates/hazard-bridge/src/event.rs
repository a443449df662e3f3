//! Script-side hazard event wrappers
//!
//! A wrapper holds only a handle. Reads go to the pinned host event and
//! every mutation is applied to it directly, so the host always sees the
//! script's changes.

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::session::HostSession;
use hazard_core::time::Instant;
use hazard_core::{
    AdvancedGeometry, EventId, HazardEvent, HazardEventView, HazardStatus, ReadOnlyHazardEvent, Value, ValueMap,
};

/// Mutable hazard event as seen by scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptEvent(pub(crate) Handle);

impl ScriptEvent {
    pub fn handle(&self) -> Handle {
        self.0
    }

    /// The pinned host event
    pub fn view<'s>(&self, session: &'s HostSession) -> Result<&'s HazardEvent> {
        session.get::<HazardEvent>(self.0)
    }

    pub fn event_id(&self, session: &HostSession) -> Result<Option<EventId>> {
        Ok(self.view(session)?.event_id().cloned())
    }

    pub fn get_hazard_attributes(&self, session: &HostSession) -> Result<ValueMap> {
        Ok(self.view(session)?.hazard_attributes().clone())
    }

    pub fn get(&self, session: &HostSession, name: &str) -> Result<Option<Value>> {
        Ok(self.view(session)?.get(name).cloned())
    }

    /// Set one attribute from a host value
    pub fn set(&self, session: &mut HostSession, name: &str, value: serde_json::Value) -> Result<()> {
        self.update(session, |e| {
            e.set(name, Value::from(value));
            Ok(())
        })
    }

    pub fn set_status(&self, session: &mut HostSession, status: HazardStatus) -> Result<()> {
        self.update(session, |e| e.set_status(status))
    }

    pub fn set_time_range(&self, session: &mut HostSession, start: Instant, end: Instant) -> Result<()> {
        self.update(session, |e| e.set_time_range(start, end))
    }

    /// Attach a pinned geometry to the event
    pub fn set_geometry(&self, session: &mut HostSession, geometry: Handle) -> Result<()> {
        let geometry = session.get::<AdvancedGeometry>(geometry)?.clone();
        self.update(session, |e| e.set_geometry(Some(geometry)))
    }

    /// Apply a checked mutation to the host event
    pub fn update<R>(
        &self,
        session: &mut HostSession,
        f: impl FnOnce(&mut HazardEvent) -> hazard_core::Result<R>,
    ) -> Result<R> {
        let event = session.get_mut::<HazardEvent>(self.0)?;
        f(event).map_err(Error::from)
    }

    /// Events are equal when their ids are
    pub fn same_event(&self, session: &HostSession, other: &ScriptEvent) -> Result<bool> {
        Ok(self.view(session)? == other.view(session)?)
    }
}

/// Read-only hazard event; offers no setters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptReadOnlyEvent(pub(crate) Handle);

impl ScriptReadOnlyEvent {
    pub fn handle(&self) -> Handle {
        self.0
    }

    pub fn view<'s>(&self, session: &'s HostSession) -> Result<&'s ReadOnlyHazardEvent> {
        session.get::<ReadOnlyHazardEvent>(self.0)
    }

    pub fn event_id(&self, session: &HostSession) -> Result<Option<EventId>> {
        Ok(self.view(session)?.event_id().cloned())
    }

    pub fn get(&self, session: &HostSession, name: &str) -> Result<Option<Value>> {
        Ok(self.view(session)?.get(name).cloned())
    }

    pub fn get_hazard_attributes(&self, session: &HostSession) -> Result<ValueMap> {
        Ok(self.view(session)?.hazard_attributes().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hazard_core::{HazardType, SiteId};

    fn pinned_event(session: &mut HostSession) -> ScriptEvent {
        let site = SiteId::new("OAX").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = HazardEvent::new(site, t0)
            .with_hazard_type(HazardType::new("FL", "W"))
            .with_time_range(t0, t0 + Duration::hours(6))
            .unwrap();
        ScriptEvent(session.pin(event))
    }

    #[test]
    fn test_mutations_reach_host() {
        let mut session = HostSession::new();
        let event = pinned_event(&mut session);
        event
            .set(&mut session, "crest", serde_json::json!({"stage": 18.5, "ufn": false}))
            .unwrap();

        let host = session.get::<HazardEvent>(event.handle()).unwrap();
        let crest = host.get("crest").and_then(Value::as_map).unwrap();
        assert_eq!(crest.get("stage"), Some(&Value::Float(18.5)));
    }

    #[test]
    fn test_invalid_mutation_is_rejected() {
        let mut session = HostSession::new();
        let event = pinned_event(&mut session);
        let start = event.view(&session).unwrap().start_time();
        let result = event.set_time_range(&mut session, start, start - Duration::hours(1));
        assert!(matches!(result, Err(Error::Core(_))));
        assert_eq!(event.view(&session).unwrap().start_time(), start);
    }

    #[test]
    fn test_set_geometry_from_handle() {
        let mut session = HostSession::new();
        let event = pinned_event(&mut session);
        let polygon = session.pin(AdvancedGeometry::polygon([(-96.0, 41.0), (-95.0, 41.0), (-95.5, 42.0)]));
        event.set_geometry(&mut session, polygon).unwrap();
        assert!(event.view(&session).unwrap().geometry().is_some());
    }
}
