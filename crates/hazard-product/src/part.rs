//! Product parts and the keys that identify their stored text

use crate::text_store::ProductTextKey;
use hazard_core::{HazardMode, SiteId};
use serde::{Deserialize, Serialize};

/// Identifies one product part across generations of a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    /// Part name, e.g. `basisBullet`
    pub name: String,
    pub product_category: String,
    /// PIL of the product the part belongs to
    pub product_id: String,
    /// Events of the segment, in segment order
    pub event_ids: Vec<String>,
    /// Segment label; empty for product-level parts
    #[serde(default)]
    pub segment: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl KeyInfo {
    pub fn new(
        name: impl Into<String>,
        product_category: impl Into<String>,
        product_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            product_category: product_category.into(),
            product_id: product_id.into(),
            event_ids: Vec::new(),
            segment: String::new(),
            label: None,
        }
    }

    pub fn with_segment(mut self, segment: impl Into<String>, event_ids: Vec<String>) -> Self {
        self.segment = segment.into();
        self.event_ids = event_ids;
        self
    }

    /// Product-text row key for this part
    pub fn text_key(&self, mode: HazardMode, office: &SiteId) -> ProductTextKey {
        ProductTextKey {
            key: self.name.clone(),
            product_category: self.product_category.clone(),
            mode: mode.as_str().to_string(),
            segment: self.segment.clone(),
            event_ids: self.event_ids.clone(),
            office_id: office.to_string(),
        }
    }
}

/// One unit of emitted text
///
/// Text resolves in this order: `current_text` if the forecaster edited the
/// part, else `previous_text` when `use_previous_text` is set and a previous
/// issuance exists, else `generated_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPart {
    pub key_info: KeyInfo,
    #[serde(default)]
    pub generated_text: String,
    #[serde(default)]
    pub previous_text: Option<String>,
    #[serde(default)]
    pub current_text: Option<String>,
    #[serde(default)]
    pub use_previous_text: bool,
    #[serde(default = "default_true")]
    pub displayable: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub segment_divider: bool,
    #[serde(default)]
    pub num_lines: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl ProductPart {
    pub fn new(key_info: KeyInfo, generated_text: impl Into<String>) -> Self {
        Self {
            key_info,
            generated_text: generated_text.into(),
            previous_text: None,
            current_text: None,
            use_previous_text: false,
            displayable: true,
            editable: false,
            required: false,
            segment_divider: false,
            num_lines: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.key_info.name
    }

    /// The text this part emits
    pub fn resolve(&self) -> &str {
        if let Some(current) = &self.current_text {
            return current;
        }
        match &self.previous_text {
            Some(previous) if self.use_previous_text => previous,
            _ => &self.generated_text,
        }
    }
}
