//! Error types for hazard-bridge

use crate::handle::Handle;
use thiserror::Error;

/// Bridge error type
#[derive(Error, Debug)]
pub enum Error {
    /// A converter matched the input but could not translate it
    #[error("{converter} could not translate: {reason}")]
    Translation { converter: &'static str, reason: String },

    #[error("Stale or released handle: {0}")]
    StaleHandle(Handle),

    #[error("No converter accepts {0}")]
    NoConverter(String),

    #[error("Core error: {0}")]
    Core(#[from] hazard_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
