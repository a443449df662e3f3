//! Hazard Bridge - host/script value translation
//!
//! Long-lived host objects (hazard events, geometries, hydrographs, SHEF
//! records, session-object managers) are pinned in a [`HostSession`] and
//! cross the bridge as handles. Value types (key info, product parts,
//! product-text rows, plain values) are copied.

mod convert;
mod error;
mod event;
mod handle;
mod hydro;
mod object;
mod session;

pub use convert::{Conversion, Converter, ConverterRegistry, ValueConverter};
pub use error::{Error, Result};
pub use event::{ScriptEvent, ScriptReadOnlyEvent};
pub use handle::{Handle, HandleArena};
pub use hydro::{Hydrograph, ShefRecord};
pub use object::{HostObject, RecordKind, ScriptObject};
pub use session::{HostResident, HostSession, SessionObjects};
