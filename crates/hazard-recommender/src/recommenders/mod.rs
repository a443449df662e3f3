//! Shipped recommenders

mod drawn_polygon;
mod expired_events;
mod extend_events;

pub use drawn_polygon::{DrawnPolygon, DURATION_HOURS, HAZARD_TYPE};
pub use expired_events::ExpiredEvents;
pub use extend_events::{ExtendEvents, EXTEND_HOURS};

use crate::error::{Error, Result};
use crate::recommender::Recommender;
use chrono::Duration;
use hazard_core::Instant;
use std::sync::Arc;

/// Every shipped recommender with the identifier it is registered under
pub fn builtin() -> Vec<(&'static str, Arc<dyn Recommender>)> {
    vec![
        (ExtendEvents::IDENTIFIER, Arc::new(ExtendEvents)),
        (DrawnPolygon::IDENTIFIER, Arc::new(DrawnPolygon)),
        (ExpiredEvents::IDENTIFIER, Arc::new(ExpiredEvents)),
    ]
}

/// `start` plus a dialog-supplied number of hours
///
/// Hours that overflow the duration or the instant fail the run instead of
/// panicking.
pub(crate) fn add_hours(tool: &str, start: Instant, hours: i64) -> Result<Instant> {
    Duration::try_hours(hours)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or_else(|| Error::Execution {
            tool: tool.to_string(),
            reason: format!("{} hours is out of range", hours),
        })
}
