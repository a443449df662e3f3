//! Moves live events whose end time has passed to elapsed

use crate::error::{Error, Result};
use crate::metadata::ScriptMetadata;
use crate::recommender::Recommender;
use hazard_core::time::is_until_further_notice;
use hazard_core::{EventSet, HazardEventView, HazardStatus, ValueMap, VisualFeature};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiredEvents;

impl ExpiredEvents {
    pub const IDENTIFIER: &'static str = "ExpiredEvents";
}

impl Recommender for ExpiredEvents {
    fn metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Expired Events", "hydro", "1.0")
            .with_description("Marks issued events past their end time as elapsed")
    }

    fn execute(&self, events: &EventSet, _: &ValueMap, _: &[VisualFeature]) -> Result<EventSet> {
        let now = events.current_time().ok_or_else(|| Error::Execution {
            tool: Self::IDENTIFIER.to_string(),
            reason: "no current time".to_string(),
        })?;

        let mut result = EventSet::new();
        for event in events.iter() {
            if !event.status().is_active() || is_until_further_notice(event.end_time()) || event.end_time() > now {
                continue;
            }
            let mut expired = event.clone();
            expired.set_status(HazardStatus::Elapsed)?;
            result.add(expired);
        }
        if !result.is_empty() {
            log::debug!("{} events elapsed at {}", result.len(), now);
            result.set_save_to_history(true);
            result.set_selected_time(now);
        }
        Ok(result)
    }
}
