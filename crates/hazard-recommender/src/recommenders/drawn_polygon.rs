//! Turns polygons the forecaster draws into new hazard events

use crate::error::{Error, Result};
use crate::metadata::ScriptMetadata;
use crate::recommender::Recommender;
use hazard_core::{
    EventSet, GeometryKind, HazardEvent, HazardStatus, HazardType, SiteId, Value, ValueMap, VisualFeature,
};

pub const HAZARD_TYPE: &str = "hazardType";
pub const DURATION_HOURS: &str = "durationHours";
const DRAWN_AREA: &str = "drawnArea";
const DEFAULT_HAZARD_TYPE: &str = "FA.Y";
const DEFAULT_DURATION_HOURS: i64 = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct DrawnPolygon;

impl DrawnPolygon {
    pub const IDENTIFIER: &'static str = "DrawnPolygon";

    fn failure(reason: impl Into<String>) -> Error {
        Error::Execution {
            tool: Self::IDENTIFIER.to_string(),
            reason: reason.into(),
        }
    }
}

impl Recommender for DrawnPolygon {
    fn metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Drawn Polygon", "hydro", "1.0")
            .with_description("Creates a hazard event for each polygon drawn")
            .with_event_state(HazardStatus::Pending)
            .with_spatial_info()
    }

    fn define_spatial_info(&self) -> Vec<VisualFeature> {
        vec![VisualFeature::new(DRAWN_AREA)
            .with_label("Draw hazard area")
            .editable()]
    }

    fn execute(&self, events: &EventSet, dialog_input: &ValueMap, spatial_input: &[VisualFeature]) -> Result<EventSet> {
        let now = events
            .current_time()
            .ok_or_else(|| Self::failure("no current time"))?;
        let site = SiteId::new(events.site_id().ok_or_else(|| Self::failure("no site"))?)?;
        let hazard_type: HazardType = dialog_input
            .get(HAZARD_TYPE)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_HAZARD_TYPE)
            .parse()?;
        let hours = dialog_input
            .get(DURATION_HOURS)
            .and_then(Value::as_int)
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_DURATION_HOURS);

        let end = super::add_hours(Self::IDENTIFIER, now, hours)?;

        let mut result = EventSet::new();
        for feature in spatial_input {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            if geometry.is_empty()
                || !matches!(geometry.kind(), GeometryKind::Polygon | GeometryKind::BufferedPolygon)
            {
                log::debug!("Skipping {}: not a polygon", feature.identifier);
                continue;
            }
            result.add(
                HazardEvent::new(site.clone(), now)
                    .with_hazard_type(hazard_type.clone())
                    .with_geometry(geometry.clone())
                    .with_time_range(now, end)?,
            );
        }
        Ok(result)
    }
}
