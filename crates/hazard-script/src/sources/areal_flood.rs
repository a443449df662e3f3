//! Areal floods (FA.W, FA.Y, FA.A)

use super::{calls_to_action, immediate_cause};
use crate::error::Result;
use crate::megawidget::{Choice, FieldType, Megawidget, MutableProperties, PropertyChanges, WidgetProperties};
use crate::metadata::{MetadataContext, MetadataResult, MetadataSource};
use hazard_core::{HazardEvent, HazardEventView, Value};

pub const HYDROLOGIC_CAUSE: &str = "hydrologicCause";
pub const DAM_NAME: &str = "damOrLeveeName";

/// Metadata for areal flood products
#[derive(Debug, Clone, Copy, Default)]
pub struct ArealFloodMetadata;

impl ArealFloodMetadata {
    pub const CLASS_NAME: &'static str = "ArealFloodMetadata";
}

impl MetadataSource for ArealFloodMetadata {
    fn execute(&self, event: &HazardEvent, _context: &MetadataContext) -> Result<MetadataResult> {
        let mut fields = vec![immediate_cause("ER")];
        if event.significance() != Some("A") {
            fields.push(
                Megawidget::new(FieldType::RadioButtons, HYDROLOGIC_CAUSE)
                    .with_label("Hydrologic Cause:")
                    .with_choices(vec![
                        Choice::labeled("rain", "Heavy rain"),
                        Choice::labeled("snowMelt", "Snow melt"),
                        Choice::labeled("damFailure", "Dam or levee failure"),
                        Choice::labeled("iceJam", "Ice jam"),
                    ])
                    .with_values("rain"),
            );
            fields.push(
                Megawidget::new(FieldType::Text, DAM_NAME)
                    .with_label("Dam or levee:")
                    .with_values("")
                    .with_enable(false),
            );
        }
        fields.push(calls_to_action(&[
            ("lowSpotsCTA", "Low spots in hilly terrain"),
            ("turnAroundCTA", "Turn around, don't drown"),
        ]));
        let tree = vec![Megawidget::new(FieldType::Composite, "arealFlood").with_fields(fields)];
        Ok(MetadataResult::new(tree))
    }

    /// The dam name is only editable for dam failures
    fn apply_interdependencies(
        &self,
        triggers: Option<&[String]>,
        properties: &MutableProperties,
    ) -> Result<Option<PropertyChanges>> {
        if triggers.is_some_and(|t| !t.iter().any(|x| x == HYDROLOGIC_CAUSE)) {
            return Ok(None);
        }
        let Some(cause) = properties.values(HYDROLOGIC_CAUSE).and_then(Value::as_str) else {
            return Ok(None);
        };
        let enable = cause == "damFailure";
        if properties.get(DAM_NAME).and_then(|p| p.enable) == Some(enable) {
            return Ok(None);
        }
        Ok(Some(PropertyChanges::from_iter([(
            DAM_NAME.to_string(),
            WidgetProperties::default().with_enable(enable),
        )])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::megawidget::find_widget;
    use crate::metadata::InterdependencyApplier;
    use chrono::{TimeZone, Utc};
    use hazard_core::{HazardType, SiteId};

    fn areal(sig: &str) -> (HazardEvent, MetadataContext) {
        let site = SiteId::new("OAX").unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        (
            HazardEvent::new(site.clone(), t0).with_hazard_type(HazardType::new("FA", sig)),
            MetadataContext::new(t0, site),
        )
    }

    #[test]
    fn test_watch_is_simple() {
        let (event, ctx) = areal("A");
        let result = ArealFloodMetadata.execute(&event, &ctx).unwrap();
        assert!(find_widget(&result.metadata, HYDROLOGIC_CAUSE).is_none());
    }

    #[test]
    fn test_dam_failure_enables_name() {
        let (event, ctx) = areal("W");
        let result = ArealFloodMetadata.execute(&event, &ctx).unwrap();
        let mut props = MutableProperties::from_tree(&result.metadata);
        props.get_mut(HYDROLOGIC_CAUSE).unwrap().values = Some(Value::from("damFailure"));

        let outcome = InterdependencyApplier::default().apply(&ArealFloodMetadata, None, &props).unwrap();
        assert!(outcome.converged);
        assert_eq!(outcome.properties.get(DAM_NAME).unwrap().enable, Some(true));
    }
}
