//! Hazard events
//!
//! [`HazardEvent`] is the mutable record scripts work with. Every setter
//! checks the event invariants:
//! - the event ID never changes once assigned
//! - `start_time <= end_time`
//! - status moves forward only (see [`HazardStatus::can_transition_to`])
//! - once ended, geometry and times are frozen
//!
//! [`ReadOnlyHazardEvent`] exposes only the [`HazardEventView`] read contract.

use crate::error::{Error, Result};
use crate::time::Instant;
use crate::{
    AdvancedGeometry, EventId, HazardMode, HazardStatus, HazardType, SiteId, Value, ValueMap,
    VisualFeature,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Attribute holding the flood severity of the last issuance
pub const PREVIOUS_FLOOD_SEVERITY: &str = "previousFloodSeverity";

/// Read contract shared by mutable and read-only hazard events
pub trait HazardEventView {
    fn event_id(&self) -> Option<&EventId>;
    fn site_id(&self) -> &SiteId;
    fn status(&self) -> HazardStatus;
    fn hazard_type(&self) -> Option<&HazardType>;
    fn creation_time(&self) -> Instant;
    fn start_time(&self) -> Instant;
    fn end_time(&self) -> Instant;
    fn hazard_mode(&self) -> HazardMode;
    fn geometry(&self) -> Option<&AdvancedGeometry>;
    fn visual_features(&self) -> &[VisualFeature];
    fn hazard_attributes(&self) -> &ValueMap;

    fn phenomenon(&self) -> Option<&str> {
        self.hazard_type().map(HazardType::phenomenon)
    }

    fn significance(&self) -> Option<&str> {
        self.hazard_type().map(HazardType::significance)
    }

    fn subtype(&self) -> Option<&str> {
        self.hazard_type().and_then(HazardType::subtype)
    }

    /// Get a single attribute
    fn get(&self, name: &str) -> Option<&Value> {
        self.hazard_attributes().get(name)
    }
}

/// A hazard event as seen by scripts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardEvent {
    event_id: Option<EventId>,
    site_id: SiteId,
    status: HazardStatus,
    hazard_type: Option<HazardType>,
    creation_time: Instant,
    start_time: Instant,
    end_time: Instant,
    hazard_mode: HazardMode,
    geometry: Option<AdvancedGeometry>,
    visual_features: Vec<VisualFeature>,
    attributes: ValueMap,
    /// Set the first time the event reaches `Issued`
    ever_issued: bool,
}

impl HazardEvent {
    /// Create a potential event with a zero-length window at `creation_time`
    pub fn new(site_id: SiteId, creation_time: Instant) -> Self {
        Self {
            event_id: None,
            site_id,
            status: HazardStatus::Potential,
            hazard_type: None,
            creation_time,
            start_time: creation_time,
            end_time: creation_time,
            hazard_mode: HazardMode::Operational,
            geometry: None,
            visual_features: Vec::new(),
            attributes: ValueMap::new(),
            ever_issued: false,
        }
    }

    /// Set the hazard type
    pub fn with_hazard_type(mut self, hazard_type: HazardType) -> Self {
        self.hazard_type = Some(hazard_type);
        self
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: HazardMode) -> Self {
        self.hazard_mode = mode;
        self
    }

    /// Set the geometry
    pub fn with_geometry(mut self, geometry: AdvancedGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the time window, checking `start <= end`
    pub fn with_time_range(mut self, start: Instant, end: Instant) -> Result<Self> {
        self.set_time_range(start, end)?;
        Ok(self)
    }

    /// Whether the event has ever been issued
    pub fn ever_issued(&self) -> bool {
        self.ever_issued
    }

    /// Snapshot as a read-only event
    pub fn to_read_only(&self) -> ReadOnlyHazardEvent {
        ReadOnlyHazardEvent::new(self.clone())
    }

    // === Setters ===

    /// Assign the event ID; a different ID cannot replace an assigned one
    pub fn set_event_id(&mut self, id: EventId) -> Result<()> {
        match &self.event_id {
            Some(existing) if *existing != id => Err(Error::ImmutableEventId(existing.to_string())),
            _ => {
                self.event_id = Some(id);
                Ok(())
            }
        }
    }

    pub fn set_site_id(&mut self, site_id: SiteId) {
        self.site_id = site_id;
    }

    /// Move to a new status
    pub fn set_status(&mut self, status: HazardStatus) -> Result<()> {
        if !self.status.can_transition_to(status, self.ever_issued) {
            return Err(Error::InvalidStatusTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        if status == HazardStatus::Issued {
            self.ever_issued = true;
        }
        self.status = status;
        Ok(())
    }

    /// Set phenomenon, significance and subtype together
    pub fn set_hazard_type(&mut self, hazard_type: Option<HazardType>) {
        self.hazard_type = hazard_type;
    }

    pub fn set_hazard_mode(&mut self, mode: HazardMode) {
        self.hazard_mode = mode;
    }

    pub fn set_creation_time(&mut self, t: Instant) {
        self.creation_time = t;
    }

    /// Set both ends of the window at once
    pub fn set_time_range(&mut self, start: Instant, end: Instant) -> Result<()> {
        self.ensure_not_ended("time range")?;
        if start > end {
            return Err(Error::InvalidTimeRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        self.start_time = start;
        self.end_time = end;
        Ok(())
    }

    pub fn set_start_time(&mut self, start: Instant) -> Result<()> {
        self.set_time_range(start, self.end_time)
    }

    pub fn set_end_time(&mut self, end: Instant) -> Result<()> {
        self.set_time_range(self.start_time, end)
    }

    pub fn set_geometry(&mut self, geometry: Option<AdvancedGeometry>) -> Result<()> {
        self.ensure_not_ended("geometry")?;
        self.geometry = geometry;
        Ok(())
    }

    pub fn set_visual_features(&mut self, features: Vec<VisualFeature>) {
        self.visual_features = features;
    }

    /// Add a visual feature, replacing one with the same identifier
    pub fn add_visual_feature(&mut self, feature: VisualFeature) {
        match self
            .visual_features
            .iter_mut()
            .find(|f| f.identifier == feature.identifier)
        {
            Some(existing) => *existing = feature,
            None => self.visual_features.push(feature),
        }
    }

    /// Set a single attribute
    ///
    /// Host values (`serde_json::Value`) are translated on the way in.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Merge a map of attributes
    pub fn add_hazard_attributes(&mut self, attributes: ValueMap) {
        self.attributes.extend(attributes);
    }

    /// Replace the whole attribute map
    pub fn set_hazard_attributes(&mut self, attributes: ValueMap) {
        self.attributes = attributes;
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.shift_remove(name)
    }

    /// Get a numeric attribute as f64
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).and_then(Value::as_float)
    }

    /// Check that `next` may take this event's place as its working copy
    ///
    /// The status change must be a legal step from this event's status. A
    /// terminal event keeps its time window and geometry.
    pub fn check_replacement(&self, next: &HazardEvent) -> Result<()> {
        if !self.status.can_transition_to(next.status, self.ever_issued) {
            return Err(Error::InvalidStatusTransition {
                from: self.status.to_string(),
                to: next.status.to_string(),
            });
        }
        if self.status.is_terminal() {
            if next.start_time != self.start_time || next.end_time != self.end_time {
                return Err(Error::EventFrozen("time range".to_string()));
            }
            if next.geometry != self.geometry {
                return Err(Error::EventFrozen("geometry".to_string()));
            }
        }
        Ok(())
    }

    /// Carry the issuance history of the copy this event replaces
    pub fn inherit_issuance(&mut self, previous: &HazardEvent) {
        self.ever_issued |= previous.ever_issued;
    }

    /// Ended and elapsed events keep their window and geometry
    fn ensure_not_ended(&self, what: &str) -> Result<()> {
        if self.status.is_terminal() {
            Err(Error::EventFrozen(what.to_string()))
        } else {
            Ok(())
        }
    }
}

impl HazardEventView for HazardEvent {
    fn event_id(&self) -> Option<&EventId> {
        self.event_id.as_ref()
    }

    fn site_id(&self) -> &SiteId {
        &self.site_id
    }

    fn status(&self) -> HazardStatus {
        self.status
    }

    fn hazard_type(&self) -> Option<&HazardType> {
        self.hazard_type.as_ref()
    }

    fn creation_time(&self) -> Instant {
        self.creation_time
    }

    fn start_time(&self) -> Instant {
        self.start_time
    }

    fn end_time(&self) -> Instant {
        self.end_time
    }

    fn hazard_mode(&self) -> HazardMode {
        self.hazard_mode
    }

    fn geometry(&self) -> Option<&AdvancedGeometry> {
        self.geometry.as_ref()
    }

    fn visual_features(&self) -> &[VisualFeature] {
        &self.visual_features
    }

    fn hazard_attributes(&self) -> &ValueMap {
        &self.attributes
    }
}

/// Equality is by event ID; events without an ID are never equal
impl PartialEq for HazardEvent {
    fn eq(&self, other: &Self) -> bool {
        matches!((&self.event_id, &other.event_id), (Some(a), Some(b)) if a == b)
    }
}

/// A hazard event that forbids mutation
///
/// Cloning is cheap; all clones share one snapshot.
#[derive(Debug, Clone)]
pub struct ReadOnlyHazardEvent {
    inner: Arc<HazardEvent>,
}

impl ReadOnlyHazardEvent {
    pub fn new(event: HazardEvent) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Copy out a mutable event
    pub fn to_mutable(&self) -> HazardEvent {
        (*self.inner).clone()
    }
}

impl HazardEventView for ReadOnlyHazardEvent {
    fn event_id(&self) -> Option<&EventId> {
        self.inner.event_id()
    }

    fn site_id(&self) -> &SiteId {
        self.inner.site_id()
    }

    fn status(&self) -> HazardStatus {
        self.inner.status()
    }

    fn hazard_type(&self) -> Option<&HazardType> {
        self.inner.hazard_type()
    }

    fn creation_time(&self) -> Instant {
        self.inner.creation_time()
    }

    fn start_time(&self) -> Instant {
        self.inner.start_time()
    }

    fn end_time(&self) -> Instant {
        self.inner.end_time()
    }

    fn hazard_mode(&self) -> HazardMode {
        self.inner.hazard_mode()
    }

    fn geometry(&self) -> Option<&AdvancedGeometry> {
        self.inner.geometry()
    }

    fn visual_features(&self) -> &[VisualFeature] {
        self.inner.visual_features()
    }

    fn hazard_attributes(&self) -> &ValueMap {
        self.inner.hazard_attributes()
    }
}

impl PartialEq for ReadOnlyHazardEvent {
    fn eq(&self, other: &Self) -> bool {
        *self.inner == *other.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Instant {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn event() -> HazardEvent {
        HazardEvent::new(SiteId::new("OAX").unwrap(), t0())
            .with_hazard_type(HazardType::new("FL", "W"))
            .with_time_range(t0(), t0() + Duration::hours(6))
            .unwrap()
    }

    #[test]
    fn test_event_id_is_immutable() {
        let mut e = event();
        e.set_event_id(EventId::new("OAX-2024-000001")).unwrap();
        e.set_event_id(EventId::new("OAX-2024-000001")).unwrap();
        assert!(matches!(
            e.set_event_id(EventId::new("OAX-2024-000002")),
            Err(Error::ImmutableEventId(_))
        ));
    }

    #[test]
    fn test_start_not_after_end() {
        let mut e = event();
        let err = e.set_end_time(t0() - Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, Error::InvalidTimeRange { .. }));
        assert!(e.start_time() <= e.end_time());
        assert_eq!(e.end_time(), t0() + Duration::hours(6));
    }

    #[test]
    fn test_ended_event_is_frozen() {
        let mut e = event();
        e.set_status(HazardStatus::Issued).unwrap();
        e.set_status(HazardStatus::Ended).unwrap();
        assert!(matches!(e.set_end_time(t0()), Err(Error::EventFrozen(_))));
        assert!(matches!(e.set_geometry(None), Err(Error::EventFrozen(_))));
        assert!(e.set_status(HazardStatus::Issued).is_err());
    }

    #[test]
    fn test_elapsed_event_is_frozen() {
        let mut e = event();
        e.set_status(HazardStatus::Issued).unwrap();
        e.set_status(HazardStatus::Elapsed).unwrap();
        assert!(matches!(e.set_start_time(t0() - Duration::hours(1)), Err(Error::EventFrozen(_))));
        assert_eq!(e.start_time(), t0());
    }

    #[test]
    fn test_replacement_of_ended_event() {
        let mut ended = event();
        ended.set_status(HazardStatus::Issued).unwrap();
        ended.set_status(HazardStatus::Ended).unwrap();

        let fresh = event();
        assert!(matches!(
            ended.check_replacement(&fresh),
            Err(Error::InvalidStatusTransition { .. })
        ));

        let mut annotated = ended.clone();
        annotated.set("note", "reviewed");
        assert!(ended.check_replacement(&annotated).is_ok());

        let mut moved = ended.clone();
        moved.end_time = t0() + Duration::hours(9);
        assert!(matches!(ended.check_replacement(&moved), Err(Error::EventFrozen(_))));
    }

    #[test]
    fn test_replacement_keeps_issuance() {
        let mut issued = event();
        issued.set_status(HazardStatus::Issued).unwrap();
        let mut next = event();
        next.set_status(HazardStatus::Issued).unwrap();
        next.ever_issued = false;
        next.inherit_issuance(&issued);
        assert!(next.ever_issued());
    }

    #[test]
    fn test_proposed_to_pending_before_issuance() {
        let mut e = event();
        e.set_status(HazardStatus::Proposed).unwrap();
        e.set_status(HazardStatus::Pending).unwrap();
        e.set_status(HazardStatus::Issued).unwrap();
        assert!(e.ever_issued());
        assert!(e.set_status(HazardStatus::Pending).is_err());
    }

    #[test]
    fn test_set_translates_host_values() {
        let mut e = event();
        e.set("crest", serde_json::json!(1000));
        e.set("cta", serde_json::json!(["turnAround"]));
        assert_eq!(e.get("crest"), Some(&Value::Int(1000)));
        assert_eq!(e.get("cta").unwrap().as_string_list(), vec!["turnAround"]);
    }

    #[test]
    fn test_equality_by_event_id() {
        let mut a = event();
        let mut b = event().with_attribute("other", true);
        assert_ne!(a, b);
        a.set_event_id(EventId::new("X-2024-000001")).unwrap();
        b.set_event_id(EventId::new("X-2024-000001")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_read_only_view() {
        let e = event().with_attribute("crest", 12.5f64);
        let ro = e.to_read_only();
        assert_eq!(ro.phenomenon(), Some("FL"));
        assert_eq!(ro.significance(), Some("W"));
        assert_eq!(ro.subtype(), None);
        assert_eq!(ro.get("crest"), Some(&Value::Float(12.5)));
        let copy = ro.to_mutable();
        assert_eq!(copy.end_time(), ro.end_time());
    }

    #[test]
    fn test_visual_feature_replaced_by_identifier() {
        let mut e = event();
        e.add_visual_feature(VisualFeature::new("base").with_label("a"));
        e.add_visual_feature(VisualFeature::new("base").with_label("b"));
        assert_eq!(e.visual_features().len(), 1);
        assert_eq!(e.visual_features()[0].label.as_deref(), Some("b"));
    }
}
