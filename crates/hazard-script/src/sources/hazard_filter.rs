//! Hazard-type filter dialog
//!
//! Not tied to a hazard type: the host opens it by class name to let the
//! forecaster choose which hazard types a settings view shows.

use crate::error::Result;
use crate::megawidget::{Choice, FieldType, Megawidget, MutableProperties, PropertyChanges};
use crate::metadata::{MetadataContext, MetadataResult, MetadataSource};
use crate::patterns::{merge_changes, ChoiceGroupToggle};
use crate::schema::HazardCategories;
use hazard_core::HazardEvent;
use indexmap::IndexMap;

pub const CATEGORIES: &str = "hazardCategories";
pub const HAZARD_TYPES: &str = "hazardTypes";

/// Category checkboxes driving a hazard-type tree
#[derive(Debug, Clone)]
pub struct HazardTypeFilter {
    groups: IndexMap<String, Choice>,
}

impl HazardTypeFilter {
    pub const CLASS_NAME: &'static str = "HazardTypeFilter";

    pub fn new(categories: &HazardCategories) -> Self {
        Self {
            groups: categories.choice_groups(),
        }
    }
}

impl MetadataSource for HazardTypeFilter {
    fn execute(&self, _event: &HazardEvent, _context: &MetadataContext) -> Result<MetadataResult> {
        let names: Vec<String> = self.groups.keys().cloned().collect();
        let all_types: Vec<String> = self
            .groups
            .values()
            .flat_map(|g| g.children.iter().map(|c| c.identifier.clone()))
            .collect();
        let tree = vec![Megawidget::new(FieldType::Composite, "hazardFilter").with_fields(vec![
            Megawidget::new(FieldType::CheckBoxes, CATEGORIES)
                .with_label("Categories:")
                .with_choices(names.iter().map(Choice::new).collect())
                .with_values(names),
            Megawidget::new(FieldType::CheckList, HAZARD_TYPES)
                .with_label("Hazard Types:")
                .with_choices(self.groups.values().cloned().collect())
                .with_values(all_types),
        ])];
        Ok(MetadataResult::new(tree))
    }

    fn apply_interdependencies(
        &self,
        triggers: Option<&[String]>,
        properties: &MutableProperties,
    ) -> Result<Option<PropertyChanges>> {
        let toggle = ChoiceGroupToggle {
            toggle: CATEGORIES,
            tree: HAZARD_TYPES,
            groups: &self.groups,
        };
        Ok(merge_changes([toggle.apply(triggers, properties)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::InterdependencyApplier;
    use chrono::{TimeZone, Utc};
    use hazard_core::{HazardType, SiteId, Value};

    fn categories() -> HazardCategories {
        HazardCategories {
            categories: IndexMap::from_iter([
                (
                    "Hydrology".to_string(),
                    vec![HazardType::new("FL", "W"), HazardType::new("FA", "Y")],
                ),
                ("Winter".to_string(), vec![HazardType::new("WS", "W")]),
            ]),
        }
    }

    #[test]
    fn test_hiding_a_category_prunes_types() {
        let filter = HazardTypeFilter::new(&categories());
        let site = SiteId::new("OAX").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let result = filter
            .execute(&HazardEvent::new(site.clone(), t0), &MetadataContext::new(t0, site))
            .unwrap();

        let mut props = MutableProperties::from_tree(&result.metadata);
        props.get_mut(CATEGORIES).unwrap().values = Some(Value::from(vec!["Winter"]));
        let triggers = vec![CATEGORIES.to_string()];
        let outcome = InterdependencyApplier::default()
            .apply(&filter, Some(&triggers), &props)
            .unwrap();

        let tree = outcome.properties.get(HAZARD_TYPES).unwrap();
        assert_eq!(tree.values, Some(Value::from(vec!["WS.W"])));
        assert_eq!(tree.choices.as_ref().map(Vec::len), Some(1));
    }
}
