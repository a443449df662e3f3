//! Hazard DB - product-text storage using native_db
//!
//! Provides a persistent [`hazard_product::ProductTextStore`] holding
//! forecaster edits and previous issuances of product parts.

mod error;
mod models;
mod store;

pub use error::{Error, Result};
pub use store::ProductTextDb;
