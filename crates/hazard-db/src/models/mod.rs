//! Database models for persistent storage.

mod product_text;

pub use product_text::*;
