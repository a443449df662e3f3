//! Pushes the end time of live events out by a forecaster-chosen amount

use crate::error::Result;
use crate::metadata::{DialogButton, DialogDescriptor, ScriptMetadata};
use crate::recommender::Recommender;
use hazard_core::time::is_until_further_notice;
use hazard_core::{EventSet, HazardEventView, Value, ValueMap, VisualFeature};
use hazard_script::{FieldType, Megawidget};

pub const EXTEND_HOURS: &str = "extendHours";
const DEFAULT_EXTEND_HOURS: i64 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendEvents;

impl ExtendEvents {
    pub const IDENTIFIER: &'static str = "ExtendEvents";

    fn dialog() -> DialogDescriptor {
        DialogDescriptor::new("Extend Events")
            .with_field(
                Megawidget::new(FieldType::IntegerSpinner, EXTEND_HOURS)
                    .with_label("Extend by (hours):")
                    .with_values(DEFAULT_EXTEND_HOURS),
            )
            .with_button(DialogButton::new("yes", "OK").as_default())
            .with_button(DialogButton::new("no", "Cancel").as_cancel())
    }
}

impl Recommender for ExtendEvents {
    fn metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Extend Events", "hydro", "1.0")
            .with_description("Extends the end time of issued and pending events")
            .with_dialog()
    }

    fn define_dialog(&self, _events: &EventSet) -> Option<DialogDescriptor> {
        Some(Self::dialog())
    }

    fn execute(&self, events: &EventSet, dialog_input: &ValueMap, _: &[VisualFeature]) -> Result<EventSet> {
        if Self::dialog().is_cancel(dialog_input) {
            return Ok(EventSet::new());
        }
        let hours = dialog_input
            .get(EXTEND_HOURS)
            .and_then(Value::as_int)
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_EXTEND_HOURS);

        let mut result = EventSet::new();
        for event in events.iter() {
            if event.status().is_terminal() || is_until_further_notice(event.end_time()) {
                continue;
            }
            let mut extended = event.clone();
            extended.set_end_time(super::add_hours(Self::IDENTIFIER, event.end_time(), hours)?)?;
            result.add(extended);
        }
        if !result.is_empty() {
            result.set_save_to_database(true);
        }
        Ok(result)
    }
}
