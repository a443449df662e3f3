//! Converters between host objects and script objects
//!
//! A converter either matches its input and translates it, or hands the
//! input back untouched so the next converter can try. Converters are
//! consulted in registration order and the first match wins.

use crate::error::{Error, Result};
use crate::event::{ScriptEvent, ScriptReadOnlyEvent};
use crate::handle::Handle;
use crate::hydro::{Hydrograph, ShefRecord};
use crate::object::{HostObject, RecordKind, ScriptObject};
use crate::session::{HostResident, HostSession, SessionObjects};
use hazard_core::{AdvancedGeometry, HazardEvent, ReadOnlyHazardEvent, Value};
use hazard_product::{KeyInfo, ProductPart, ProductTextRow};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// Result of offering an object to one converter
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion<T, U> {
    /// Translated
    Matched(T),
    /// Not this converter's type; the input, unchanged
    Unmatched(U),
}

/// One pair of translations
pub trait Converter: Send + Sync {
    fn name(&self) -> &'static str;

    fn to_script(&self, session: &HostSession, object: HostObject) -> Result<Conversion<ScriptObject, HostObject>>;

    fn to_host(&self, session: &HostSession, object: ScriptObject) -> Result<Conversion<HostObject, ScriptObject>>;
}

/// Converter for a handle-carrying type: wraps the handle, copies nothing
pub struct HandleConverter<T> {
    name: &'static str,
    from_host: fn(&HostObject) -> Option<Handle>,
    into_host: fn(Handle) -> HostObject,
    from_script: fn(&ScriptObject) -> Option<Handle>,
    into_script: fn(Handle) -> ScriptObject,
    _kind: PhantomData<fn() -> T>,
}

impl<T: HostResident> HandleConverter<T> {
    fn check(&self, session: &HostSession, handle: Handle) -> Result<()> {
        if session.contains::<T>(handle) {
            Ok(())
        } else {
            Err(Error::StaleHandle(handle))
        }
    }
}

impl<T: HostResident> Converter for HandleConverter<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn to_script(&self, session: &HostSession, object: HostObject) -> Result<Conversion<ScriptObject, HostObject>> {
        match (self.from_host)(&object) {
            Some(handle) => {
                self.check(session, handle)?;
                Ok(Conversion::Matched((self.into_script)(handle)))
            }
            None => Ok(Conversion::Unmatched(object)),
        }
    }

    fn to_host(&self, session: &HostSession, object: ScriptObject) -> Result<Conversion<HostObject, ScriptObject>> {
        match (self.from_script)(&object) {
            Some(handle) => {
                self.check(session, handle)?;
                Ok(Conversion::Matched((self.into_host)(handle)))
            }
            None => Ok(Conversion::Unmatched(object)),
        }
    }
}

/// Converter for a value type: deep-copies fields into a plain record
pub struct RecordConverter<T> {
    name: &'static str,
    kind: RecordKind,
    take: fn(HostObject) -> std::result::Result<T, HostObject>,
    wrap: fn(T) -> HostObject,
}

impl<T> RecordConverter<T> {
    fn fail(&self, reason: impl ToString) -> Error {
        Error::Translation {
            converter: self.name,
            reason: reason.to_string(),
        }
    }
}

impl<T: Serialize + DeserializeOwned> Converter for RecordConverter<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn to_script(&self, _session: &HostSession, object: HostObject) -> Result<Conversion<ScriptObject, HostObject>> {
        let value = match (self.take)(object) {
            Ok(value) => value,
            Err(object) => return Ok(Conversion::Unmatched(object)),
        };
        let json = serde_json::to_value(&value).map_err(|e| self.fail(e))?;
        match Value::from(json) {
            Value::Map(fields) => Ok(Conversion::Matched(ScriptObject::Record(self.kind, fields))),
            other => Err(self.fail(format!("expected a record, got {}", other.type_name()))),
        }
    }

    fn to_host(&self, _session: &HostSession, object: ScriptObject) -> Result<Conversion<HostObject, ScriptObject>> {
        match object {
            ScriptObject::Record(kind, fields) if kind == self.kind => {
                let json = Value::Map(fields).to_json();
                let value: T = serde_json::from_value(json).map_err(|e| self.fail(e))?;
                Ok(Conversion::Matched((self.wrap)(value)))
            }
            other => Ok(Conversion::Unmatched(other)),
        }
    }
}

/// Plain values: host JSON values and script values
pub struct ValueConverter;

impl Converter for ValueConverter {
    fn name(&self) -> &'static str {
        "value"
    }

    fn to_script(&self, _session: &HostSession, object: HostObject) -> Result<Conversion<ScriptObject, HostObject>> {
        match object {
            HostObject::Json(json) => Ok(Conversion::Matched(ScriptObject::Value(Value::from(json)))),
            other => Ok(Conversion::Unmatched(other)),
        }
    }

    fn to_host(&self, _session: &HostSession, object: ScriptObject) -> Result<Conversion<HostObject, ScriptObject>> {
        match object {
            ScriptObject::Value(value) => Ok(Conversion::Matched(HostObject::Json(value.to_json()))),
            other => Ok(Conversion::Unmatched(other)),
        }
    }
}

/// Ordered converter list
#[derive(Default)]
pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every shipped converter
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(HandleConverter::<HazardEvent> {
            name: "hazardEvent",
            from_host: |o| match o {
                HostObject::Event(h) => Some(*h),
                _ => None,
            },
            into_host: HostObject::Event,
            from_script: |o| match o {
                ScriptObject::Event(e) => Some(e.handle()),
                _ => None,
            },
            into_script: |h| ScriptObject::Event(ScriptEvent(h)),
            _kind: PhantomData,
        });
        registry.register(HandleConverter::<ReadOnlyHazardEvent> {
            name: "readOnlyHazardEvent",
            from_host: |o| match o {
                HostObject::ReadOnlyEvent(h) => Some(*h),
                _ => None,
            },
            into_host: HostObject::ReadOnlyEvent,
            from_script: |o| match o {
                ScriptObject::ReadOnlyEvent(e) => Some(e.handle()),
                _ => None,
            },
            into_script: |h| ScriptObject::ReadOnlyEvent(ScriptReadOnlyEvent(h)),
            _kind: PhantomData,
        });
        registry.register(HandleConverter::<AdvancedGeometry> {
            name: "geometry",
            from_host: |o| match o {
                HostObject::Geometry(h) => Some(*h),
                _ => None,
            },
            into_host: HostObject::Geometry,
            from_script: |o| match o {
                ScriptObject::Geometry(h) => Some(*h),
                _ => None,
            },
            into_script: ScriptObject::Geometry,
            _kind: PhantomData,
        });
        registry.register(HandleConverter::<Hydrograph> {
            name: "hydrograph",
            from_host: |o| match o {
                HostObject::Hydrograph(h) => Some(*h),
                _ => None,
            },
            into_host: HostObject::Hydrograph,
            from_script: |o| match o {
                ScriptObject::Hydrograph(h) => Some(*h),
                _ => None,
            },
            into_script: ScriptObject::Hydrograph,
            _kind: PhantomData,
        });
        registry.register(HandleConverter::<ShefRecord> {
            name: "shef",
            from_host: |o| match o {
                HostObject::Shef(h) => Some(*h),
                _ => None,
            },
            into_host: HostObject::Shef,
            from_script: |o| match o {
                ScriptObject::Shef(h) => Some(*h),
                _ => None,
            },
            into_script: ScriptObject::Shef,
            _kind: PhantomData,
        });
        registry.register(HandleConverter::<SessionObjects> {
            name: "sessionObjectManager",
            from_host: |o| match o {
                HostObject::SessionObjects(h) => Some(*h),
                _ => None,
            },
            into_host: HostObject::SessionObjects,
            from_script: |o| match o {
                ScriptObject::SessionObjects(h) => Some(*h),
                _ => None,
            },
            into_script: ScriptObject::SessionObjects,
            _kind: PhantomData,
        });
        registry.register(RecordConverter::<KeyInfo> {
            name: "keyInfo",
            kind: RecordKind::KeyInfo,
            take: |o| match o {
                HostObject::KeyInfo(k) => Ok(k),
                other => Err(other),
            },
            wrap: HostObject::KeyInfo,
        });
        registry.register(RecordConverter::<ProductPart> {
            name: "productPart",
            kind: RecordKind::ProductPart,
            take: |o| match o {
                HostObject::ProductPart(p) => Ok(p),
                other => Err(other),
            },
            wrap: HostObject::ProductPart,
        });
        registry.register(RecordConverter::<ProductTextRow> {
            name: "productText",
            kind: RecordKind::ProductText,
            take: |o| match o {
                HostObject::ProductText(r) => Ok(r),
                other => Err(other),
            },
            wrap: HostObject::ProductText,
        });
        registry.register(ValueConverter);
        registry
    }

    /// Append a converter; it is consulted after those already registered
    pub fn register(&mut self, converter: impl Converter + 'static) {
        self.converters.push(Box::new(converter));
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Translate a host object; errors from a matching converter surface unchanged
    pub fn to_script(&self, session: &HostSession, object: HostObject) -> Result<ScriptObject> {
        let mut object = object;
        for converter in &self.converters {
            match converter.to_script(session, object)? {
                Conversion::Matched(script) => {
                    log::debug!("{} converted {} to script", converter.name(), script.kind());
                    return Ok(script);
                }
                Conversion::Unmatched(unchanged) => object = unchanged,
            }
        }
        Err(Error::NoConverter(object.kind().to_string()))
    }

    /// Translate a script object back to the host
    pub fn to_host(&self, session: &HostSession, object: ScriptObject) -> Result<HostObject> {
        let mut object = object;
        for converter in &self.converters {
            match converter.to_host(session, object)? {
                Conversion::Matched(host) => {
                    log::debug!("{} converted {} to host", converter.name(), host.kind());
                    return Ok(host);
                }
                Conversion::Unmatched(unchanged) => object = unchanged,
            }
        }
        Err(Error::NoConverter(object.kind().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hazard_core::{HazardMode, SiteId, ValueMap};
    use hazard_product::ProductTextKey;

    fn session_with_event() -> (HostSession, Handle) {
        let mut session = HostSession::new();
        let site = SiteId::new("OAX").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let handle = session.pin(HazardEvent::new(site, t0));
        (session, handle)
    }

    fn key_info() -> KeyInfo {
        KeyInfo::new("basisBullet", "FLW_FLS", "FLW").with_segment("FL.W", vec!["OAX-2024-000001".to_string()])
    }

    #[test]
    fn test_handle_round_trip_keeps_identity() {
        let (session, handle) = session_with_event();
        let registry = ConverterRegistry::standard();
        let script = registry.to_script(&session, HostObject::Event(handle)).unwrap();
        assert_eq!(script, ScriptObject::Event(ScriptEvent(handle)));

        let host = registry.to_host(&session, script.clone()).unwrap();
        assert_eq!(host, HostObject::Event(handle));
        assert_eq!(registry.to_script(&session, host).unwrap(), script);
    }

    #[test]
    fn test_record_round_trip() {
        let session = HostSession::new();
        let registry = ConverterRegistry::standard();
        let part = ProductPart::new(key_info(), "...BASIS...");

        let script = registry.to_script(&session, HostObject::ProductPart(part.clone())).unwrap();
        let (kind, fields) = script.record().unwrap();
        assert_eq!(kind, RecordKind::ProductPart);
        assert!(fields.contains_key("keyInfo"));

        let host = registry.to_host(&session, script.clone()).unwrap();
        assert_eq!(host, HostObject::ProductPart(part));
        assert_eq!(registry.to_script(&session, host).unwrap(), script);
    }

    #[test]
    fn test_product_text_row_round_trip() {
        let session = HostSession::new();
        let registry = ConverterRegistry::standard();
        let key: ProductTextKey = key_info().text_key(HazardMode::Test, &SiteId::new("OAX").unwrap());
        let row = ProductTextRow::new(key, "edited");
        let script = registry.to_script(&session, HostObject::ProductText(row.clone())).unwrap();
        assert_eq!(registry.to_host(&session, script).unwrap(), HostObject::ProductText(row));
    }

    #[test]
    fn test_malformed_record_is_translation_error() {
        let session = HostSession::new();
        let registry = ConverterRegistry::standard();
        let mut fields = ValueMap::new();
        fields.insert("name".to_string(), Value::Int(3));
        let result = registry.to_host(&session, ScriptObject::Record(RecordKind::KeyInfo, fields));
        assert!(matches!(result, Err(Error::Translation { converter: "keyInfo", .. })));
    }

    #[test]
    fn test_stale_handle_surfaces() {
        let (mut session, handle) = session_with_event();
        session.release::<HazardEvent>(handle).unwrap();
        let registry = ConverterRegistry::standard();
        assert!(matches!(
            registry.to_script(&session, HostObject::Event(handle)),
            Err(Error::StaleHandle(_))
        ));
    }

    #[test]
    fn test_no_converter() {
        let session = HostSession::new();
        let registry = ConverterRegistry::new();
        assert!(matches!(
            registry.to_script(&session, HostObject::Json(serde_json::json!(1))),
            Err(Error::NoConverter(_))
        ));
    }

    #[test]
    fn test_first_registered_converter_wins() {
        struct Shadow;

        impl Converter for Shadow {
            fn name(&self) -> &'static str {
                "shadow"
            }

            fn to_script(&self, _: &HostSession, object: HostObject) -> Result<Conversion<ScriptObject, HostObject>> {
                match object {
                    HostObject::Json(_) => Ok(Conversion::Matched(ScriptObject::Value(Value::from("shadowed")))),
                    other => Ok(Conversion::Unmatched(other)),
                }
            }

            fn to_host(&self, _: &HostSession, object: ScriptObject) -> Result<Conversion<HostObject, ScriptObject>> {
                Ok(Conversion::Unmatched(object))
            }
        }

        let session = HostSession::new();
        let mut registry = ConverterRegistry::new();
        registry.register(Shadow);
        registry.register(ValueConverter);
        let script = registry.to_script(&session, HostObject::Json(serde_json::json!(1))).unwrap();
        assert_eq!(script, ScriptObject::Value(Value::from("shadowed")));

        let host = registry.to_host(&session, ScriptObject::Value(Value::Int(2))).unwrap();
        assert_eq!(host, HostObject::Json(serde_json::json!(2)));
    }
}
