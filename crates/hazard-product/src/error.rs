//! Error types for hazard-product

use thiserror::Error;

/// Product assembly error type
#[derive(Debug, Error)]
pub enum Error {
    /// No renderer registered for a product part
    #[error("Unknown product part: {0}")]
    UnknownPart(String),

    /// A product-text row with this key already exists
    #[error("Product text already exists: {0}")]
    DuplicateKey(String),

    /// No product-text row with this key
    #[error("Product text not found: {0}")]
    NotFound(String),

    /// A renderer needed data the product does not carry
    #[error("Missing data for {part}: {what}")]
    MissingData { part: String, what: String },

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Hazard model error
    #[error("Core error: {0}")]
    Core(#[from] hazard_core::Error),
}

/// Result type for product operations
pub type Result<T> = std::result::Result<T, Error>;
