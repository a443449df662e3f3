//! Host session: the arenas that own host-resident objects

use crate::error::{Error, Result};
use crate::handle::{Handle, HandleArena};
use crate::hydro::{Hydrograph, ShefRecord};
use hazard_core::{AdvancedGeometry, HazardEvent, ReadOnlyHazardEvent, Value, ValueMap};

/// Per-session key/value store scripts use to keep objects between calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionObjects {
    entries: ValueMap,
}

impl SessionObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// A host-resident type with its own arena in [`HostSession`]
pub trait HostResident: Sized {
    const KIND: &'static str;

    fn arena(session: &HostSession) -> &HandleArena<Self>;
    fn arena_mut(session: &mut HostSession) -> &mut HandleArena<Self>;
}

macro_rules! host_resident {
    ($ty:ty, $field:ident, $kind:literal) => {
        impl HostResident for $ty {
            const KIND: &'static str = $kind;

            fn arena(session: &HostSession) -> &HandleArena<Self> {
                &session.$field
            }

            fn arena_mut(session: &mut HostSession) -> &mut HandleArena<Self> {
                &mut session.$field
            }
        }
    };
}

/// Owner of every pinned host object
///
/// Scripts never own these objects; they hold handles and the host decides
/// when to release them.
#[derive(Debug, Default)]
pub struct HostSession {
    events: HandleArena<HazardEvent>,
    read_only_events: HandleArena<ReadOnlyHazardEvent>,
    geometries: HandleArena<AdvancedGeometry>,
    hydrographs: HandleArena<Hydrograph>,
    shef_records: HandleArena<ShefRecord>,
    session_objects: HandleArena<SessionObjects>,
}

host_resident!(HazardEvent, events, "hazard event");
host_resident!(ReadOnlyHazardEvent, read_only_events, "read-only hazard event");
host_resident!(AdvancedGeometry, geometries, "geometry");
host_resident!(Hydrograph, hydrographs, "hydrograph");
host_resident!(ShefRecord, shef_records, "SHEF record");
host_resident!(SessionObjects, session_objects, "session-object manager");

impl HostSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a host object and get its handle
    pub fn pin<T: HostResident>(&mut self, value: T) -> Handle {
        T::arena_mut(self).pin(value)
    }

    pub fn get<T: HostResident>(&self, handle: Handle) -> Result<&T> {
        T::arena(self).get(handle).ok_or(Error::StaleHandle(handle))
    }

    pub fn get_mut<T: HostResident>(&mut self, handle: Handle) -> Result<&mut T> {
        T::arena_mut(self).get_mut(handle).ok_or(Error::StaleHandle(handle))
    }

    pub fn contains<T: HostResident>(&self, handle: Handle) -> bool {
        T::arena(self).contains(handle)
    }

    /// Unpin a host object, handing ownership back to the caller
    pub fn release<T: HostResident>(&mut self, handle: Handle) -> Result<T> {
        let released = T::arena_mut(self).release(handle).ok_or(Error::StaleHandle(handle));
        if released.is_ok() {
            log::debug!("Released {} {}", T::KIND, handle);
        }
        released
    }

    /// Number of pinned objects of one kind
    pub fn pinned<T: HostResident>(&self) -> usize {
        T::arena(self).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hazard_core::SiteId;

    #[test]
    fn test_pin_and_release_by_kind() {
        let mut session = HostSession::new();
        let site = SiteId::new("OAX").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = session.pin(HazardEvent::new(site, t0));
        let objects = session.pin(SessionObjects::new());

        session.get_mut::<SessionObjects>(objects).unwrap().set("lastRun", 5);
        assert_eq!(
            session.get::<SessionObjects>(objects).unwrap().get("lastRun"),
            Some(&Value::Int(5))
        );
        assert_eq!(session.pinned::<HazardEvent>(), 1);

        session.release::<HazardEvent>(event).unwrap();
        assert!(matches!(session.get::<HazardEvent>(event), Err(Error::StaleHandle(_))));
        assert!(session.release::<HazardEvent>(event).is_err());
    }
}
