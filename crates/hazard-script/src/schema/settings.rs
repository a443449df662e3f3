//! Settings schema

use hazard_core::{HazardStatus, HazardType};
use serde::{Deserialize, Serialize};

/// Map position and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_zoom() -> f64 {
    7.0
}

/// A named view of the session: which hazards are shown and how new ones start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Unique identifier for this settings definition
    #[serde(rename = "settingsID")]
    pub settings_id: String,
    pub display_name: String,
    /// Hazard types shown in the console
    #[serde(default)]
    pub visible_types: Vec<HazardType>,
    /// Statuses shown in the console
    #[serde(default = "default_statuses")]
    pub visible_statuses: Vec<HazardStatus>,
    #[serde(default)]
    pub visible_sites: Vec<String>,
    /// Hazard category preselected for new events
    #[serde(default)]
    pub default_category: Option<String>,
    /// Duration of new events
    #[serde(default = "default_duration")]
    pub default_duration_minutes: i64,
    #[serde(default)]
    pub map_center: Option<MapCenter>,
}

fn default_statuses() -> Vec<HazardStatus> {
    vec![
        HazardStatus::Pending,
        HazardStatus::Proposed,
        HazardStatus::Issued,
        HazardStatus::Ending,
    ]
}

fn default_duration() -> i64 {
    480
}

impl Settings {
    pub fn new(settings_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            settings_id: settings_id.into(),
            display_name: display_name.into(),
            visible_types: Vec::new(),
            visible_statuses: default_statuses(),
            visible_sites: Vec::new(),
            default_category: None,
            default_duration_minutes: default_duration(),
            map_center: None,
        }
    }

    /// An empty type list shows every type
    pub fn shows_type(&self, hazard_type: &HazardType) -> bool {
        self.visible_types.is_empty()
            || self
                .visible_types
                .iter()
                .any(|t| t == hazard_type || t == &hazard_type.without_subtype())
    }

    pub fn shows_status(&self, status: HazardStatus) -> bool {
        self.visible_statuses.contains(&status)
    }

    pub fn default_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.default_duration_minutes)
    }
}
