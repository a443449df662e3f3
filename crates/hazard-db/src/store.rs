//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use hazard_product::{ProductTextKey, ProductTextQuery, ProductTextRow, ProductTextStore};
use native_db::*;
use std::path::Path;
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredProductText>().unwrap();
    models
});

/// Database store for product text.
pub struct ProductTextDb {
    pub(crate) db: Database<'static>,
}

impl ProductTextDb {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Insert a row; fails if the key exists.
    pub fn insert_row(&self, row: &ProductTextRow) -> Result<()> {
        let stored = StoredProductText::from_row(row)?;
        let rw = self.db.rw_transaction()?;
        if rw.get().primary::<StoredProductText>(stored.id.clone())?.is_some() {
            return Err(Error::DuplicateKey(stored.id));
        }
        rw.insert(stored)?;
        rw.commit()?;
        Ok(())
    }

    /// Replace a row; fails if the key is absent.
    pub fn replace_row(&self, row: &ProductTextRow) -> Result<()> {
        let stored = StoredProductText::from_row(row)?;
        let rw = self.db.rw_transaction()?;
        if rw.get().primary::<StoredProductText>(stored.id.clone())?.is_none() {
            return Err(Error::NotFound(stored.id));
        }
        rw.upsert(stored)?;
        rw.commit()?;
        Ok(())
    }

    /// Delete a row; fails if the key is absent.
    pub fn delete_row(&self, key: &ProductTextKey) -> Result<()> {
        let id = key.storage_key();
        let rw = self.db.rw_transaction()?;
        match rw.get().primary::<StoredProductText>(id.clone())? {
            Some(stored) => {
                rw.remove(stored)?;
            }
            None => return Err(Error::NotFound(id)),
        }
        rw.commit()?;
        Ok(())
    }

    /// Rows of one part matching a query, ordered by storage key.
    pub fn query_rows(&self, query: &ProductTextQuery) -> Result<Vec<ProductTextRow>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredProductText>(StoredProductTextKey::part)?;
        let iter = scan.start_with(query.key.as_str())?;
        let stored: std::result::Result<Vec<StoredProductText>, _> = iter.collect();
        let mut stored = stored.map_err(|e| Error::Database(e.to_string()))?;
        stored.sort_by(|a, b| a.id.cmp(&b.id));

        let mut rows = Vec::new();
        for s in stored {
            let row = s.to_row()?;
            if query.matches(&row.key) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Count all rows.
    pub fn count(&self) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredProductText>()?;
        let iter = scan.all()?;
        Ok(iter.count())
    }

    /// Clear all data.
    pub fn clear(&self) -> Result<()> {
        let ids: Vec<String> = {
            let r = self.db.r_transaction()?;
            let scan = r.scan().primary::<StoredProductText>()?;
            let iter = scan.all()?;
            let rows: std::result::Result<Vec<StoredProductText>, _> = iter.collect();
            let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
            rows.into_iter().map(|s| s.id).collect()
        };

        let rw = self.db.rw_transaction()?;
        for id in ids {
            if let Some(stored) = rw.get().primary::<StoredProductText>(id)? {
                rw.remove(stored)?;
            }
        }
        rw.commit()?;
        log::debug!("Cleared product-text database");
        Ok(())
    }
}

impl ProductTextStore for ProductTextDb {
    fn create(&mut self, row: ProductTextRow) -> hazard_product::Result<()> {
        Ok(self.insert_row(&row)?)
    }

    fn update(&mut self, row: ProductTextRow) -> hazard_product::Result<()> {
        Ok(self.replace_row(&row)?)
    }

    fn delete(&mut self, key: &ProductTextKey) -> hazard_product::Result<()> {
        Ok(self.delete_row(key)?)
    }

    fn retrieve(&self, query: &ProductTextQuery) -> hazard_product::Result<Vec<ProductTextRow>> {
        Ok(self.query_rows(query)?)
    }
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<Error> for hazard_product::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(key) => hazard_product::Error::NotFound(key),
            Error::DuplicateKey(key) => hazard_product::Error::DuplicateKey(key),
            other => hazard_product::Error::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hazard_core::{HazardEvent, HazardEventStore, HazardMode, HazardType, SiteId, Value};
    use hazard_product::{ProductCategory, ProductGenerator, ProductRequest, FLOOD_SEVERITY};

    fn key(part: &str, office: &str) -> ProductTextKey {
        ProductTextKey {
            key: part.to_string(),
            product_category: "FLW_FLS".to_string(),
            mode: "operational".to_string(),
            segment: "FL.W".to_string(),
            event_ids: vec!["OAX-2024-000001".to_string()],
            office_id: office.to_string(),
        }
    }

    #[test]
    fn test_crud() {
        let mut db = ProductTextDb::in_memory().unwrap();
        db.create(ProductTextRow::new(key("basisBullet", "OAX"), "one")).unwrap();
        assert!(matches!(
            db.create(ProductTextRow::new(key("basisBullet", "OAX"), "again")),
            Err(hazard_product::Error::DuplicateKey(_))
        ));

        db.create_or_update(ProductTextRow::new(key("basisBullet", "OAX"), "two"))
            .unwrap();
        let row = db.get(&key("basisBullet", "OAX")).unwrap().unwrap();
        assert_eq!(row.value, Value::from("two"));
        assert_eq!(db.count().unwrap(), 1);

        db.delete(&key("basisBullet", "OAX")).unwrap();
        assert!(matches!(
            db.delete(&key("basisBullet", "OAX")),
            Err(hazard_product::Error::NotFound(_))
        ));
    }

    #[test]
    fn test_event_id_lists_stay_distinct() {
        let mut db = ProductTextDb::in_memory().unwrap();
        let mut joined = key("basisBullet", "OAX");
        joined.event_ids = vec!["A,B".to_string()];
        let mut split = key("basisBullet", "OAX");
        split.event_ids = vec!["A".to_string(), "B".to_string()];

        db.create(ProductTextRow::new(joined.clone(), "joined")).unwrap();
        db.create(ProductTextRow::new(split.clone(), "split")).unwrap();
        assert_eq!(db.count().unwrap(), 2);
        assert_eq!(db.get(&joined).unwrap().unwrap().value, Value::from("joined"));
    }

    #[test]
    fn test_retrieve_filters_by_part_and_office() {
        let mut db = ProductTextDb::in_memory().unwrap();
        db.create(ProductTextRow::new(key("basisBullet", "OAX"), "b")).unwrap();
        db.create(ProductTextRow::new(key("basisBullet", "DMX"), "a")).unwrap();
        db.create(ProductTextRow::new(key("basisBulletExtra", "OAX"), "x")).unwrap();

        let mut query = ProductTextQuery::from(&key("basisBullet", "OAX"));
        query.office_id = None;
        let rows = db.retrieve(&query).unwrap();
        let offices: Vec<&str> = rows.iter().map(|r| r.key.office_id.as_str()).collect();
        assert_eq!(offices, vec!["DMX", "OAX"]);

        db.clear().unwrap();
        assert_eq!(db.count().unwrap(), 0);
    }

    #[test]
    fn test_generator_round_trip() {
        let site = SiteId::new("OAX").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut events = HazardEventStore::new(site.clone());
        events
            .insert(
                HazardEvent::new(site.clone(), t0)
                    .with_hazard_type(HazardType::new("FL", "W"))
                    .with_time_range(t0, t0 + Duration::hours(12))
                    .unwrap()
                    .with_attribute(FLOOD_SEVERITY, "1"),
            )
            .unwrap();
        let request = ProductRequest {
            category: ProductCategory::FlwFls,
            site_id: site,
            issue_time: t0,
            mode: HazardMode::Operational,
        };

        let vtec = hazard_script::ConfigLoader::with_defaults().unwrap().finish().vtec;
        let mut generator = ProductGenerator::new(vtec, ProductTextDb::in_memory().unwrap());
        let current: Vec<HazardEvent> = events.iter().cloned().collect();
        let product = generator.generate(&current, &events, &request).unwrap().remove(0);
        generator.issue(&product, &mut events).unwrap();
        assert_eq!(generator.store().count().unwrap(), product.editable_parts.len());
    }
}
