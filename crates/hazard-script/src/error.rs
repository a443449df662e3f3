//! Error types for hazard-script

use thiserror::Error;

/// Metadata and configuration error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("Duplicate megawidget field name: {0}")]
    DuplicateFieldName(String),

    #[error("Metadata source could not be loaded: {0}")]
    MetadataLoad(String),

    #[error("Interdependency function failed: {0}")]
    Interdependency(String),

    #[error("Invalid event-driven tool configuration: {0}")]
    InvalidEventDrivenConfig(String),

    #[error("Core error: {0}")]
    Core(#[from] hazard_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
