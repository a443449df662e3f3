//! Hazard category schema

use crate::megawidget::Choice;
use hazard_core::HazardType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Hazard types grouped by category, in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardCategories {
    pub categories: IndexMap<String, Vec<HazardType>>,
}

impl HazardCategories {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn types_in(&self, category: &str) -> &[HazardType] {
        self.categories.get(category).map_or(&[], Vec::as_slice)
    }

    /// Category a hazard type belongs to, trying the subtype-free type second
    pub fn category_of(&self, hazard_type: &HazardType) -> Option<&str> {
        let bare = hazard_type.without_subtype();
        self.categories
            .iter()
            .find(|(_, types)| types.contains(hazard_type))
            .or_else(|| self.categories.iter().find(|(_, types)| types.contains(&bare)))
            .map(|(name, _)| name.as_str())
    }

    /// One choice group per category, children being the hazard types
    pub fn choice_groups(&self) -> IndexMap<String, Choice> {
        self.categories
            .iter()
            .map(|(name, types)| {
                let children = types.iter().map(|t| Choice::new(t.to_string())).collect();
                (name.clone(), Choice::new(name.clone()).with_children(children))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
