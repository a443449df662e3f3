//! Error types for hazard-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Event ID is already assigned: {0}")]
    ImmutableEventId(String),

    #[error("Event has ended or elapsed; {0} can no longer change")]
    EventFrozen(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid hazard type: {0}")]
    InvalidHazardType(String),

    #[error("Invalid site ID: {0}")]
    InvalidSiteId(String),

    #[error("Event {event_id} is locked by workstation {holder}")]
    Locked { event_id: String, holder: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
