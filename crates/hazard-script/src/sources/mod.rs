//! Shipped metadata sources

mod areal_flood;
mod flash_flood;
mod hazard_filter;
mod river_flood;

pub use areal_flood::ArealFloodMetadata;
pub use flash_flood::FlashFloodMetadata;
pub use hazard_filter::HazardTypeFilter;
pub use river_flood::{
    ends_until_further_notice, RiverFloodMetadata, CREST, FALL_BELOW, FALL_BELOW_UFN, RISE_ABOVE, TIME_SCALE,
};

use crate::megawidget::{Choice, FieldType, Megawidget};
use crate::metadata::MetadataSource;
use crate::schema::HazardCategories;
use std::sync::Arc;

/// Every shipped source, keyed by the class name the registry uses
pub fn builtin(categories: &HazardCategories) -> Vec<(&'static str, Arc<dyn MetadataSource>)> {
    vec![
        (RiverFloodMetadata::CLASS_NAME, Arc::new(RiverFloodMetadata)),
        (FlashFloodMetadata::CLASS_NAME, Arc::new(FlashFloodMetadata)),
        (ArealFloodMetadata::CLASS_NAME, Arc::new(ArealFloodMetadata)),
        (HazardTypeFilter::CLASS_NAME, Arc::new(HazardTypeFilter::new(categories))),
    ]
}

/// Immediate-cause selector shared by the flood sources
fn immediate_cause(default: &str) -> Megawidget {
    Megawidget::new(FieldType::ComboBox, "immediateCause")
        .with_label("Immediate Cause:")
        .with_choices(vec![
            Choice::labeled("ER", "Excessive Rainfall"),
            Choice::labeled("SM", "Snowmelt"),
            Choice::labeled("RS", "Rain and Snowmelt"),
            Choice::labeled("DM", "Dam or Levee Failure"),
            Choice::labeled("IJ", "Ice Jam"),
            Choice::labeled("MC", "Other Multiple Causes"),
            Choice::labeled("UU", "Unknown"),
        ])
        .with_values(default)
}

/// Calls-to-action checkboxes
fn calls_to_action(ctas: &[(&str, &str)]) -> Megawidget {
    Megawidget::new(FieldType::CheckBoxes, "cta")
        .with_label("Calls to Action:")
        .with_choices(ctas.iter().map(|(id, label)| Choice::labeled(*id, *label)).collect())
        .with_values(Vec::<String>::new())
}
