//! Schema definitions for RON configuration tables

pub mod categories;
pub mod event_driven;
pub mod settings;
pub mod startup;
pub mod vtec;

pub use categories::HazardCategories;
pub use event_driven::{EventDrivenToolEntry, EventDrivenTools, ToolType, TriggerType};
pub use settings::{MapCenter, Settings};
pub use startup::StartupConfig;
pub use vtec::{VtecEntry, VtecTable};
