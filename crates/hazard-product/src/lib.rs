//! Hazard Product - assembly helpers for legacy text products
//!
//! This crate builds on `hazard-core` to provide:
//!
//! - **Product parts**: generated/previous/current text with edit flags
//! - **Formatter**: part-renderer dispatch table and the legacy text formatter
//! - **Generator**: segments events, selects PILs, tracks edits and issuances
//! - **Product-text store**: persistence contract plus an in-memory store
//! - **PIL selection**: the VTEC decision table
//!
//! # Example
//!
//! ```rust,ignore
//! use hazard_product::{InMemoryProductTextStore, ProductGenerator, ProductRequest};
//!
//! let mut generator = ProductGenerator::new(tables.vtec.clone(), InMemoryProductTextStore::new());
//! let products = generator.generate(&events, &store, &request)?;
//! generator.issue(&products[0], &mut store)?;
//! ```

mod error;
mod formatter;
mod generator;
mod part;
mod pil;
mod text_store;

pub use error::{Error, Result};
pub use formatter::{
    FormattedProduct, FormatterContext, FormatterRegistry, LegacyFormatter, PartRenderer, PartFlags,
    PriorText, ProductInfo, Segment, SegmentEntry, SEGMENT_DELIMITER, TEST_MESSAGE, UGCS,
};
pub use generator::{GeneratedProduct, ProductGenerator, ProductRequest};
pub use part::{KeyInfo, ProductPart};
pub use pil::{
    select_pil, FloodSeverity, Hvtec, Pil, PilSelection, ProductCategory, VtecAction, VtecRecord, FLOOD_SEVERITY,
};
pub use text_store::{
    InMemoryProductTextStore, ProductTextKey, ProductTextQuery, ProductTextRow, ProductTextStore, CURRENT_TEXT,
    PREVIOUS_TEXT,
};
