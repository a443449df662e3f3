//! Objects on either side of the bridge

use crate::event::{ScriptEvent, ScriptReadOnlyEvent};
use crate::handle::Handle;
use hazard_core::{Value, ValueMap};
use hazard_product::{KeyInfo, ProductPart, ProductTextRow};
use serde::{Deserialize, Serialize};

/// Host-side object: a handle into the session, or a value type
#[derive(Debug, Clone, PartialEq)]
pub enum HostObject {
    Event(Handle),
    ReadOnlyEvent(Handle),
    Geometry(Handle),
    Hydrograph(Handle),
    Shef(Handle),
    SessionObjects(Handle),
    KeyInfo(KeyInfo),
    ProductPart(ProductPart),
    ProductText(ProductTextRow),
    /// A plain host value
    Json(serde_json::Value),
}

impl HostObject {
    pub fn kind(&self) -> &'static str {
        match self {
            HostObject::Event(_) => "hazard event",
            HostObject::ReadOnlyEvent(_) => "read-only hazard event",
            HostObject::Geometry(_) => "geometry",
            HostObject::Hydrograph(_) => "hydrograph",
            HostObject::Shef(_) => "SHEF record",
            HostObject::SessionObjects(_) => "session-object manager",
            HostObject::KeyInfo(_) => "key info",
            HostObject::ProductPart(_) => "product part",
            HostObject::ProductText(_) => "product-text row",
            HostObject::Json(_) => "host value",
        }
    }
}

/// Tag of a plain script record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    KeyInfo,
    ProductPart,
    ProductText,
}

/// Script-side mirror of a host object
///
/// Wrappers of handle types carry only the handle; value types are copied
/// into a plain record.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptObject {
    Event(ScriptEvent),
    ReadOnlyEvent(ScriptReadOnlyEvent),
    Geometry(Handle),
    Hydrograph(Handle),
    Shef(Handle),
    SessionObjects(Handle),
    Record(RecordKind, ValueMap),
    Value(Value),
}

impl ScriptObject {
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptObject::Event(_) => "hazard event",
            ScriptObject::ReadOnlyEvent(_) => "read-only hazard event",
            ScriptObject::Geometry(_) => "geometry",
            ScriptObject::Hydrograph(_) => "hydrograph",
            ScriptObject::Shef(_) => "SHEF record",
            ScriptObject::SessionObjects(_) => "session-object manager",
            ScriptObject::Record(RecordKind::KeyInfo, _) => "key-info record",
            ScriptObject::Record(RecordKind::ProductPart, _) => "product-part record",
            ScriptObject::Record(RecordKind::ProductText, _) => "product-text record",
            ScriptObject::Value(_) => "script value",
        }
    }

    /// Fields of a plain record
    pub fn record(&self) -> Option<(RecordKind, &ValueMap)> {
        match self {
            ScriptObject::Record(kind, fields) => Some((*kind, fields)),
            _ => None,
        }
    }
}
