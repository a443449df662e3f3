//! Error types for hazard-recommender

use thiserror::Error;

/// Recommender runtime error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown recommender: {0}")]
    UnknownTool(String),

    #[error("Recommender already running: {0}")]
    AlreadyRunning(String),

    /// The recommender itself failed; nothing was applied
    #[error("Recommender {tool} failed: {reason}")]
    Execution { tool: String, reason: String },

    /// The result could not be applied; nothing was applied
    #[error("Recommender {tool} returned an unusable result: {reason}")]
    InvalidResult { tool: String, reason: String },

    #[error("Core error: {0}")]
    Core(#[from] hazard_core::Error),

    #[error("Script error: {0}")]
    Script(#[from] hazard_script::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
