//! Flash flood warnings (FF.W and its subtypes)

use super::{calls_to_action, immediate_cause};
use crate::error::Result;
use crate::megawidget::{Choice, FieldType, Megawidget, MutableProperties, PropertyChanges};
use crate::metadata::{MetadataContext, MetadataResult, MetadataSource};
use crate::patterns::{merge_changes, PresetSelector};
use hazard_core::{HazardEvent, HazardEventView};

pub const RAIN_AMOUNT: &str = "rainAmt";
pub const RAIN_SO_FAR: &str = "rainSoFar";

const RAIN_PRESETS: [(&str, Option<f64>); 5] = [
    ("rainKnown", None),
    ("rain1", Some(1.0)),
    ("rain2", Some(2.0)),
    ("rain3", Some(3.0)),
    ("rainEdit", None),
];

const RAINFALL: PresetSelector<'static> = PresetSelector {
    selector: RAIN_AMOUNT,
    field: RAIN_SO_FAR,
    presets: &RAIN_PRESETS,
};

/// Metadata for flash flood warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct FlashFloodMetadata;

impl FlashFloodMetadata {
    pub const CLASS_NAME: &'static str = "FlashFloodMetadata";
}

impl MetadataSource for FlashFloodMetadata {
    fn execute(&self, event: &HazardEvent, _context: &MetadataContext) -> Result<MetadataResult> {
        let cause = match event.subtype() {
            Some("BurstDam") => "DM",
            _ => "ER",
        };
        let fields = vec![
            immediate_cause(cause),
            Megawidget::new(FieldType::ComboBox, RAIN_AMOUNT)
                .with_label("Rain so far:")
                .with_choices(vec![
                    Choice::labeled("rainKnown", "Unknown"),
                    Choice::labeled("rain1", "One inch"),
                    Choice::labeled("rain2", "Two inches"),
                    Choice::labeled("rain3", "Three inches"),
                    Choice::labeled("rainEdit", "Enter amount"),
                ])
                .with_values("rainKnown"),
            Megawidget::new(FieldType::FractionSpinner, RAIN_SO_FAR)
                .with_label("Inches:")
                .with_values(0.0)
                .with_enable(false)
                .with_hint("minValue", 0.0)
                .with_hint("maxValue", 99.0)
                .with_hint("incrementDelta", 0.25),
            calls_to_action(&[
                ("actQuicklyCTA", "Act quickly"),
                ("turnAroundCTA", "Turn around, don't drown"),
                ("nightTimeCTA", "Nighttime flooding"),
            ]),
        ];
        let tree = vec![Megawidget::new(FieldType::Composite, "flashFlood").with_fields(fields)];
        Ok(MetadataResult::new(tree))
    }

    fn apply_interdependencies(
        &self,
        triggers: Option<&[String]>,
        properties: &MutableProperties,
    ) -> Result<Option<PropertyChanges>> {
        Ok(merge_changes([RAINFALL.apply(triggers, properties)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::megawidget::find_widget;
    use crate::metadata::InterdependencyApplier;
    use chrono::{TimeZone, Utc};
    use hazard_core::{HazardType, SiteId, Value};

    fn dam_break() -> (HazardEvent, MetadataContext) {
        let site = SiteId::new("OAX").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let hazard_type: HazardType = "FF.W.BurstDam".parse().unwrap();
        (
            HazardEvent::new(site.clone(), t0).with_hazard_type(hazard_type),
            MetadataContext::new(t0, site),
        )
    }

    #[test]
    fn test_subtype_picks_cause() {
        let (event, ctx) = dam_break();
        let result = FlashFloodMetadata.execute(&event, &ctx).unwrap();
        let cause = find_widget(&result.metadata, "immediateCause").unwrap();
        assert_eq!(cause.values, Some(Value::from("DM")));
    }

    #[test]
    fn test_rain_preset_disables_spinner() {
        let (event, ctx) = dam_break();
        let result = FlashFloodMetadata.execute(&event, &ctx).unwrap();
        let mut props = MutableProperties::from_tree(&result.metadata);
        props.get_mut(RAIN_AMOUNT).unwrap().values = Some(Value::from("rain3"));

        let triggers = vec![RAIN_AMOUNT.to_string()];
        let outcome = InterdependencyApplier::default()
            .apply(&FlashFloodMetadata, Some(&triggers), &props)
            .unwrap();
        let spinner = outcome.properties.get(RAIN_SO_FAR).unwrap();
        assert_eq!(spinner.values, Some(Value::Float(3.0)));
        assert_eq!(spinner.enable, Some(false));

        let mut props = outcome.properties;
        props.get_mut(RAIN_AMOUNT).unwrap().values = Some(Value::from("rainEdit"));
        let outcome = InterdependencyApplier::default()
            .apply(&FlashFloodMetadata, Some(&triggers), &props)
            .unwrap();
        assert_eq!(outcome.properties.get(RAIN_SO_FAR).unwrap().enable, Some(true));
    }
}
