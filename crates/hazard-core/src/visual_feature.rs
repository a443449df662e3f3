//! Visual features: display-only overlays attached to events or solicited by recommenders

use crate::{AdvancedGeometry, ValueMap};
use serde::{Deserialize, Serialize};

/// A display-only overlay record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualFeature {
    /// Identifier, unique within its owner
    pub identifier: String,
    /// Geometry the feature draws
    #[serde(default)]
    pub geometry: Option<AdvancedGeometry>,
    /// Label drawn with the geometry
    #[serde(default)]
    pub label: Option<String>,
    /// Whether the forecaster may reshape the geometry
    #[serde(default)]
    pub editable: bool,
    /// Whether the forecaster may drag the feature
    #[serde(default)]
    pub movable: bool,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub fill_color: Option<String>,
    /// Other display properties, passed through opaquely
    #[serde(default)]
    pub properties: ValueMap,
}

impl VisualFeature {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            geometry: None,
            label: None,
            editable: false,
            movable: false,
            border_color: None,
            fill_color: None,
            properties: ValueMap::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: AdvancedGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self.movable = true;
        self
    }
}
