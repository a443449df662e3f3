//! Hazard Core - hazard event model for the scripting runtime
//!
//! This crate provides the types every other hazard crate builds on:
//! - Dynamic attribute values (`Value`, `ValueMap`)
//! - Event, site and hazard-type identifiers
//! - Hazard events with checked setters and a read-only view
//! - Event sets carrying session attributes and result flags
//! - Geometry, visual features and time helpers
//! - The per-session event store and lock service

mod error;
mod event;
pub mod event_set;
mod geometry;
mod identity;
mod lock;
mod status;
mod store;
pub mod time;
mod value;
mod visual_feature;

pub use error::{Error, Result};
pub use event::{HazardEvent, HazardEventView, ReadOnlyHazardEvent, PREVIOUS_FLOOD_SEVERITY};
pub use event_set::EventSet;
pub use geometry::{AdvancedGeometry, BoundingBox, Coordinate, GeometryKind};
pub use identity::{EventId, EventIdDisplayType, HazardType, SiteId};
pub use lock::{InMemoryLockService, LockService, LockTable, WorkstationId};
pub use status::{HazardMode, HazardStatus};
pub use store::HazardEventStore;
pub use time::{Instant, TimeUnit};
pub use value::{Value, ValueMap};
pub use visual_feature::VisualFeature;
