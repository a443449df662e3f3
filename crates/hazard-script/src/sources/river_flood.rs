//! River-flood point hazards (FL.W, FL.A, FL.Y)

use super::{calls_to_action, immediate_cause};
use crate::error::Result;
use crate::megawidget::{Choice, FieldType, Megawidget, MutableProperties, PropertyChanges};
use crate::metadata::{MetadataContext, MetadataResult, MetadataSource};
use crate::patterns::{merge_changes, UntilFurtherNotice, DEFAULT_INTERVAL_MILLIS, LAST_INTERVAL};
use hazard_core::time::{is_until_further_notice_millis, to_epoch_millis, UNTIL_FURTHER_NOTICE_MILLIS};
use hazard_core::{HazardEvent, HazardEventView, Value, ValueMap};

pub const RISE_ABOVE: &str = "riseAbove";
pub const CREST: &str = "crest";
pub const FALL_BELOW: &str = "fallBelow";
pub const TIME_SCALE: &str = "riseAbove:crest:fallBelow";
pub const FALL_BELOW_UFN: &str = "fallBelowUntilFurtherNotice";

const UFN: UntilFurtherNotice<'static> = UntilFurtherNotice {
    checkbox: FALL_BELOW_UFN,
    time_scale: TIME_SCALE,
    state: FALL_BELOW,
    anchor: CREST,
};

/// Metadata for forecast-point river floods
#[derive(Debug, Clone, Copy, Default)]
pub struct RiverFloodMetadata;

impl RiverFloodMetadata {
    pub const CLASS_NAME: &'static str = "RiverFloodMetadata";

    fn severity(significance: &str) -> Megawidget {
        let default = match significance {
            "W" => "1",
            "Y" => "0",
            _ => "N",
        };
        Megawidget::new(FieldType::ComboBox, "floodSeverity")
            .with_label("Flood Severity:")
            .with_choices(vec![
                Choice::labeled("N", "N (None)"),
                Choice::labeled("0", "0 (Areal flood or flash flood products)"),
                Choice::labeled("1", "1 (Minor)"),
                Choice::labeled("2", "2 (Moderate)"),
                Choice::labeled("3", "3 (Major)"),
                Choice::labeled("U", "U (Unknown)"),
            ])
            .with_values(default)
    }
}

impl MetadataSource for RiverFloodMetadata {
    fn execute(&self, event: &HazardEvent, _context: &MetadataContext) -> Result<MetadataResult> {
        let start = to_epoch_millis(event.start_time());
        let end = to_epoch_millis(event.end_time());
        let stored = |name: &str| event.get(name).and_then(Value::as_int);

        let rise_above = stored(RISE_ABOVE).unwrap_or(start);
        let crest = stored(CREST).unwrap_or(start + (end - start) / 2);
        let fall_below = stored(FALL_BELOW).unwrap_or(end);
        let ufn = is_until_further_notice_millis(fall_below);
        let last_interval = if ufn {
            DEFAULT_INTERVAL_MILLIS
        } else {
            fall_below - crest
        };

        let times = ValueMap::from_iter([
            (RISE_ABOVE.to_string(), Value::Int(rise_above)),
            (CREST.to_string(), Value::Int(crest)),
            (FALL_BELOW.to_string(), Value::Int(fall_below)),
        ]);
        let time_scale = Megawidget::new(FieldType::TimeScale, TIME_SCALE)
            .with_label("Rise Above / Crest / Fall Below")
            .with_values(times)
            .with_value_editables(ValueMap::from_iter([
                (RISE_ABOVE.to_string(), Value::Bool(true)),
                (CREST.to_string(), Value::Bool(true)),
                (FALL_BELOW.to_string(), Value::Bool(!ufn)),
            ]))
            .with_extra_data(ValueMap::from_iter([(
                LAST_INTERVAL.to_string(),
                Value::Int(last_interval),
            )]));

        let mut fields = vec![immediate_cause("ER")];
        let significance = event.significance().unwrap_or_default();
        if significance != "A" {
            fields.push(Self::severity(significance));
        }
        fields.push(time_scale);
        fields.push(
            Megawidget::new(FieldType::CheckBox, FALL_BELOW_UFN)
                .with_label("Fall below until further notice")
                .with_values(ufn),
        );
        fields.push(calls_to_action(&[
            ("safetyCTA", "Safety"),
            ("stayAwayCTA", "Stay away"),
            ("turnAroundCTA", "Turn around, don't drown"),
        ]));

        let tree = vec![Megawidget::new(FieldType::Composite, "riverFlood").with_fields(fields)];

        let mut result = MetadataResult::new(tree);
        if stored(CREST).is_none() || stored(FALL_BELOW).is_none() {
            let mut modified = event.clone();
            modified.set(RISE_ABOVE, rise_above);
            modified.set(CREST, crest);
            modified.set(FALL_BELOW, fall_below);
            result.modified_event = Some(modified);
        }
        Ok(result)
    }

    fn apply_interdependencies(
        &self,
        triggers: Option<&[String]>,
        properties: &MutableProperties,
    ) -> Result<Option<PropertyChanges>> {
        Ok(merge_changes([UFN.apply(triggers, properties)]))
    }
}

/// Whether a river-flood event ends until further notice
pub fn ends_until_further_notice(event: &HazardEvent) -> bool {
    event
        .get(FALL_BELOW)
        .and_then(Value::as_int)
        .is_some_and(|ms| ms == UNTIL_FURTHER_NOTICE_MILLIS)
}
