//! Site startup configuration schema

use super::settings::MapCenter;
use crate::error::{Error, Result};
use hazard_core::{EventIdDisplayType, SiteId};
use serde::{Deserialize, Serialize};

/// Sites a workstation may operate as, and how event ids are shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupConfig {
    pub map_center: MapCenter,
    pub possible_sites: Vec<SiteId>,
    #[serde(default)]
    pub visible_sites: Vec<SiteId>,
    #[serde(default)]
    pub backup_sites: Vec<SiteId>,
    #[serde(default)]
    pub event_id_display_type: EventIdDisplayType,
}

impl StartupConfig {
    /// Visible and backup sites must be possible sites
    pub fn validate(&self) -> Result<()> {
        if self.possible_sites.is_empty() {
            return Err(Error::MissingField("possibleSites".to_string()));
        }
        let stray = self
            .visible_sites
            .iter()
            .chain(&self.backup_sites)
            .find(|s| !self.possible_sites.contains(s));
        match stray {
            Some(site) => Err(Error::InvalidSchema(format!("site {} is not a possible site", site))),
            None => Ok(()),
        }
    }

    pub fn is_backup_for(&self, site: &SiteId) -> bool {
        self.backup_sites.contains(site)
    }
}
