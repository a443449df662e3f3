//! Hazard Script - metadata registry and configuration tables
//!
//! Provides:
//! - Megawidget descriptors and mutable-property snapshots
//! - Metadata sources and the bounded interdependency applier
//! - The ordered hazard metadata registry and shipped sources
//! - RON configuration tables (registry, settings, categories, VTEC,
//!   site startup, event-driven tools)

mod error;
mod loader;
pub mod megawidget;
mod metadata;
pub mod patterns;
mod registry;
pub mod schema;
pub mod sources;

pub use error::{Error, Result};
pub use loader::{ConfigLoader, ConfigTables};
pub use megawidget::{
    Choice, FieldType, Megawidget, MutableProperties, PropertyChanges, WidgetProperties,
};
pub use metadata::{
    ApplyOutcome, InterdependencyApplier, MetadataContext, MetadataResult, MetadataSource,
};
pub use registry::{HazardMetadata, MetadataRegistry, RegistryEntry};
pub use schema::{
    EventDrivenToolEntry, EventDrivenTools, HazardCategories, MapCenter, Settings, StartupConfig,
    ToolType, TriggerType, VtecEntry, VtecTable,
};
