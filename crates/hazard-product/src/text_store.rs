//! Product-text persistence contract
//!
//! Rows hold forecaster edits and previous issuances of product parts,
//! keyed by `(key, productCategory, mode, segment, eventIDs, officeID)`.

use crate::error::{Error, Result};
use hazard_core::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row value field holding the forecaster's edit
pub const CURRENT_TEXT: &str = "currentText";
/// Row value field holding the last issued text
pub const PREVIOUS_TEXT: &str = "previousText";

/// Key of a product-text row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTextKey {
    pub key: String,
    pub product_category: String,
    pub mode: String,
    pub segment: String,
    /// Ordered; two keys with the same IDs in another order differ
    pub event_ids: Vec<String>,
    #[serde(rename = "officeID")]
    pub office_id: String,
}

impl ProductTextKey {
    /// Flat form used as the storage key; rows sort by it
    ///
    /// Every field is written as `<byte length>:<text>`, and the event ID list
    /// is prefixed with its count, so two distinct keys never flatten to the
    /// same string whatever characters the fields hold.
    pub fn storage_key(&self) -> String {
        fn push(out: &mut String, field: &str) {
            out.push_str(&field.len().to_string());
            out.push(':');
            out.push_str(field);
            out.push('|');
        }

        let mut out = String::new();
        push(&mut out, &self.key);
        push(&mut out, &self.product_category);
        push(&mut out, &self.mode);
        push(&mut out, &self.segment);
        out.push_str(&self.event_ids.len().to_string());
        out.push('#');
        for id in &self.event_ids {
            push(&mut out, id);
        }
        push(&mut out, &self.office_id);
        out
    }
}

/// A stored product-text row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTextRow {
    pub key: ProductTextKey,
    pub value: Value,
}

impl ProductTextRow {
    pub fn new(key: ProductTextKey, value: impl Into<Value>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// A string field of a map-valued row
    pub fn text_field(&self, field: &str) -> Option<&str> {
        self.value.as_map()?.get(field)?.as_str()
    }
}

/// Query for [`ProductTextStore::retrieve`]
///
/// Every field must match; `office_id: None` matches any office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTextQuery {
    pub key: String,
    pub product_category: String,
    pub mode: String,
    pub segment: String,
    pub event_ids: Vec<String>,
    pub office_id: Option<String>,
}

impl ProductTextQuery {
    pub fn matches(&self, key: &ProductTextKey) -> bool {
        self.key == key.key
            && self.product_category == key.product_category
            && self.mode == key.mode
            && self.segment == key.segment
            && self.event_ids == key.event_ids
            && self.office_id.as_ref().map_or(true, |office| *office == key.office_id)
    }
}

impl From<&ProductTextKey> for ProductTextQuery {
    fn from(key: &ProductTextKey) -> Self {
        Self {
            key: key.key.clone(),
            product_category: key.product_category.clone(),
            mode: key.mode.clone(),
            segment: key.segment.clone(),
            event_ids: key.event_ids.clone(),
            office_id: Some(key.office_id.clone()),
        }
    }
}

/// Storage for product-text rows
pub trait ProductTextStore {
    /// Insert a new row; fails if the key exists
    fn create(&mut self, row: ProductTextRow) -> Result<()>;

    /// Replace an existing row; fails if the key is absent
    fn update(&mut self, row: ProductTextRow) -> Result<()>;

    /// Remove a row; fails if the key is absent
    fn delete(&mut self, key: &ProductTextKey) -> Result<()>;

    /// Matching rows ordered by storage key
    fn retrieve(&self, query: &ProductTextQuery) -> Result<Vec<ProductTextRow>>;

    /// Insert or replace a row
    fn create_or_update(&mut self, row: ProductTextRow) -> Result<()> {
        match self.update(row.clone()) {
            Err(Error::NotFound(_)) => self.create(row),
            other => other,
        }
    }

    /// The single row with exactly this key
    fn get(&self, key: &ProductTextKey) -> Result<Option<ProductTextRow>> {
        Ok(self.retrieve(&ProductTextQuery::from(key))?.into_iter().next())
    }
}

/// Product-text store held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductTextStore {
    rows: BTreeMap<String, ProductTextRow>,
}

impl InMemoryProductTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ProductTextStore for InMemoryProductTextStore {
    fn create(&mut self, row: ProductTextRow) -> Result<()> {
        let storage_key = row.key.storage_key();
        if self.rows.contains_key(&storage_key) {
            return Err(Error::DuplicateKey(storage_key));
        }
        self.rows.insert(storage_key, row);
        Ok(())
    }

    fn update(&mut self, row: ProductTextRow) -> Result<()> {
        match self.rows.get_mut(&row.key.storage_key()) {
            Some(slot) => {
                *slot = row;
                Ok(())
            }
            None => Err(Error::NotFound(row.key.storage_key())),
        }
    }

    fn delete(&mut self, key: &ProductTextKey) -> Result<()> {
        let storage_key = key.storage_key();
        self.rows
            .remove(&storage_key)
            .map(|_| ())
            .ok_or(Error::NotFound(storage_key))
    }

    fn retrieve(&self, query: &ProductTextQuery) -> Result<Vec<ProductTextRow>> {
        Ok(self
            .rows
            .values()
            .filter(|row| query.matches(&row.key))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(office: &str) -> ProductTextKey {
        ProductTextKey {
            key: "basisBullet".to_string(),
            product_category: "FLW_FLS".to_string(),
            mode: "operational".to_string(),
            segment: "1".to_string(),
            event_ids: vec!["OAX-2024-000001".to_string(), "OAX-2024-000002".to_string()],
            office_id: office.to_string(),
        }
    }

    #[test]
    fn test_create_update_delete() {
        let mut store = InMemoryProductTextStore::new();
        store.create(ProductTextRow::new(key("OAX"), "one")).unwrap();
        assert!(matches!(
            store.create(ProductTextRow::new(key("OAX"), "again")),
            Err(Error::DuplicateKey(_))
        ));

        store.update(ProductTextRow::new(key("OAX"), "two")).unwrap();
        assert_eq!(store.get(&key("OAX")).unwrap().unwrap().value, Value::from("two"));

        store.delete(&key("OAX")).unwrap();
        assert!(matches!(store.delete(&key("OAX")), Err(Error::NotFound(_))));
        assert!(matches!(
            store.update(ProductTextRow::new(key("OAX"), "three")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_storage_keys_never_collide() {
        let with_ids = |ids: &[&str]| ProductTextKey {
            event_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..key("OAX")
        };
        let joined = with_ids(&["A,B"]);
        let split = with_ids(&["A", "B"]);
        assert_ne!(joined.storage_key(), split.storage_key());

        let mut piped = key("OAX");
        piped.key = "basisBullet|FLW_FLS".to_string();
        piped.product_category = String::new();
        let mut plain = key("OAX");
        plain.product_category = "FLW_FLS".to_string();
        assert_ne!(piped.storage_key(), plain.storage_key());

        let mut store = InMemoryProductTextStore::new();
        store.create(ProductTextRow::new(joined.clone(), "joined")).unwrap();
        store.create(ProductTextRow::new(split.clone(), "split")).unwrap();
        store.update(ProductTextRow::new(split.clone(), "split again")).unwrap();
        assert_eq!(store.get(&joined).unwrap().unwrap().value, Value::from("joined"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_create_or_update() {
        let mut store = InMemoryProductTextStore::new();
        store.create_or_update(ProductTextRow::new(key("OAX"), "one")).unwrap();
        store.create_or_update(ProductTextRow::new(key("OAX"), "two")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key("OAX")).unwrap().unwrap().value, Value::from("two"));
    }

    #[test]
    fn test_retrieve_any_office_in_key_order() {
        let mut store = InMemoryProductTextStore::new();
        store.create(ProductTextRow::new(key("OAX"), "b")).unwrap();
        store.create(ProductTextRow::new(key("DMX"), "a")).unwrap();

        let mut query = ProductTextQuery::from(&key("OAX"));
        assert_eq!(store.retrieve(&query).unwrap().len(), 1);

        query.office_id = None;
        let rows = store.retrieve(&query).unwrap();
        let offices: Vec<&str> = rows.iter().map(|r| r.key.office_id.as_str()).collect();
        assert_eq!(offices, vec!["DMX", "OAX"]);

        query.event_ids.reverse();
        assert!(store.retrieve(&query).unwrap().is_empty());
    }
}
