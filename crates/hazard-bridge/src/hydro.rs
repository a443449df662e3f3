//! Hydrograph and SHEF observation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One SHEF-encoded observation or forecast value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShefRecord {
    /// Forecast point identifier
    pub lid: String,
    /// Physical element code, e.g. "HG" for stage
    pub physical_element: String,
    /// Type/source code, e.g. "RG" observed or "FF" forecast
    pub type_source: String,
    pub valid_time: DateTime<Utc>,
    pub value: f64,
}

impl ShefRecord {
    pub fn new(lid: impl Into<String>, physical_element: impl Into<String>, valid_time: DateTime<Utc>, value: f64) -> Self {
        Self {
            lid: lid.into(),
            physical_element: physical_element.into(),
            type_source: "RG".to_string(),
            valid_time,
            value,
        }
    }

    pub fn with_type_source(mut self, type_source: impl Into<String>) -> Self {
        self.type_source = type_source.into();
        self
    }
}

/// A time series for one forecast point and physical element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hydrograph {
    pub lid: String,
    pub physical_element: String,
    /// Records in ascending valid-time order
    records: Vec<ShefRecord>,
}

impl Hydrograph {
    pub fn new(lid: impl Into<String>, physical_element: impl Into<String>) -> Self {
        Self {
            lid: lid.into(),
            physical_element: physical_element.into(),
            records: Vec::new(),
        }
    }

    /// Insert a record, keeping time order; a record at an existing time replaces it
    pub fn push(&mut self, record: ShefRecord) {
        match self.records.binary_search_by_key(&record.valid_time, |r| r.valid_time) {
            Ok(i) => self.records[i] = record,
            Err(i) => self.records.insert(i, record),
        }
    }

    pub fn with_record(mut self, record: ShefRecord) -> Self {
        self.push(record);
        self
    }

    pub fn records(&self) -> &[ShefRecord] {
        &self.records
    }

    /// Highest value; the earliest one wins ties
    pub fn crest(&self) -> Option<&ShefRecord> {
        self.records
            .iter()
            .fold(None, |best: Option<&ShefRecord>, r| match best {
                Some(b) if b.value >= r.value => Some(b),
                _ => Some(r),
            })
    }

    pub fn latest(&self) -> Option<&ShefRecord> {
        self.records.last()
    }

    /// The record valid at `t`, i.e. the last one at or before it
    pub fn value_at(&self, t: DateTime<Utc>) -> Option<&ShefRecord> {
        let after = self.records.partition_point(|r| r.valid_time <= t);
        after.checked_sub(1).map(|i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
