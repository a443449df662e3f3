//! Product-text models for database storage.

use crate::error::{Error, Result};
use hazard_core::Value;
use hazard_product::{ProductTextKey, ProductTextRow};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored product-text row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredProductText {
    /// Primary key - flattened row key.
    #[primary_key]
    pub id: String,
    /// Part name the row belongs to.
    #[secondary_key]
    pub part: String,
    /// Serialized row key.
    pub key: Vec<u8>,
    /// Serialized row value.
    pub value: Vec<u8>,
}

impl StoredProductText {
    /// Create from a product-text row.
    pub fn from_row(row: &ProductTextRow) -> Result<Self> {
        let key = bincode::serialize(&row.key).map_err(|e| Error::Serialization(e.to_string()))?;
        let value = bincode::serialize(&row.value).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            id: row.key.storage_key(),
            part: row.key.key.clone(),
            key,
            value,
        })
    }

    /// Convert to a product-text row.
    pub fn to_row(&self) -> Result<ProductTextRow> {
        let key: ProductTextKey =
            bincode::deserialize(&self.key).map_err(|e| Error::Serialization(e.to_string()))?;
        let value: Value =
            bincode::deserialize(&self.value).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(ProductTextRow { key, value })
    }
}
