//! VTEC table schema

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-phensig product rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtecEntry {
    pub headline: String,
    /// Whether an issued event's area may change on continuation
    #[serde(default)]
    pub allow_area_change: bool,
    /// Whether an issued event's end time may change on continuation
    #[serde(default = "default_true")]
    pub allow_time_change: bool,
}

fn default_true() -> bool {
    true
}

/// VTEC rules keyed by phensig (e.g. "FL.W")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VtecTable {
    pub phensigs: IndexMap<String, VtecEntry>,
}

impl VtecTable {
    pub fn get(&self, phensig: &str) -> Option<&VtecEntry> {
        self.phensigs.get(phensig)
    }

    pub fn headline(&self, phensig: &str) -> Option<&str> {
        self.get(phensig).map(|e| e.headline.as_str())
    }

    pub fn allows_area_change(&self, phensig: &str) -> bool {
        self.get(phensig).is_some_and(|e| e.allow_area_change)
    }

    pub fn allows_time_change(&self, phensig: &str) -> bool {
        self.get(phensig).map_or(true, |e| e.allow_time_change)
    }

    pub fn len(&self) -> usize {
        self.phensigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phensigs.is_empty()
    }
}
