//! Time helpers
//!
//! Instants are `chrono::DateTime<Utc>`. The host speaks milliseconds since
//! the epoch, and several host interfaces drop sub-minute precision, so times
//! that pass through them are compared at minute granularity.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An absolute instant
pub type Instant = DateTime<Utc>;

/// "Until further notice" end time, in epoch seconds (2038-01-19T03:14:07Z)
pub const UNTIL_FURTHER_NOTICE_SECONDS: i64 = i32::MAX as i64;

/// "Until further notice" end time, in epoch milliseconds
pub const UNTIL_FURTHER_NOTICE_MILLIS: i64 = UNTIL_FURTHER_NOTICE_SECONDS * 1000;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Granularity for rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Minute,
    Hour,
}

impl TimeUnit {
    fn millis(self) -> i64 {
        match self {
            TimeUnit::Minute => MILLIS_PER_MINUTE,
            TimeUnit::Hour => MILLIS_PER_HOUR,
        }
    }
}

/// Convert an instant to epoch milliseconds
pub fn to_epoch_millis(t: Instant) -> i64 {
    t.timestamp_millis()
}

/// Convert epoch milliseconds to an instant
pub fn from_epoch_millis(ms: i64) -> Result<Instant> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::InvalidOperation(format!("epoch milliseconds out of range: {}", ms)))
}

/// The until-further-notice sentinel as an instant
pub fn until_further_notice() -> Instant {
    // The sentinel is well inside chrono's range.
    DateTime::from_timestamp(UNTIL_FURTHER_NOTICE_SECONDS, 0).unwrap_or_default()
}

/// Check whether an instant is the until-further-notice sentinel
pub fn is_until_further_notice(t: Instant) -> bool {
    t.timestamp() == UNTIL_FURTHER_NOTICE_SECONDS
}

/// Check whether epoch milliseconds hold the until-further-notice sentinel
pub fn is_until_further_notice_millis(ms: i64) -> bool {
    ms.div_euclid(1000) == UNTIL_FURTHER_NOTICE_SECONDS
}

/// Round down to the start of the enclosing unit
pub fn round_down(t: Instant, unit: TimeUnit) -> Instant {
    let ms = to_epoch_millis(t);
    let rounded = ms - ms.rem_euclid(unit.millis());
    DateTime::from_timestamp_millis(rounded).unwrap_or(t)
}

/// Round to the nearest unit, halves rounding up
pub fn round_nearest(t: Instant, unit: TimeUnit) -> Instant {
    let ms = to_epoch_millis(t);
    let step = unit.millis();
    let rem = ms.rem_euclid(step);
    let rounded = if rem * 2 >= step { ms - rem + step } else { ms - rem };
    DateTime::from_timestamp_millis(rounded).unwrap_or(t)
}

/// Minute-granularity equivalence
pub fn same_minute(a: Instant, b: Instant) -> bool {
    round_down(a, TimeUnit::Minute) == round_down(b, TimeUnit::Minute)
}

/// Minute-granularity equivalence on epoch milliseconds
pub fn same_minute_millis(a: i64, b: i64) -> bool {
    a.div_euclid(MILLIS_PER_MINUTE) == b.div_euclid(MILLIS_PER_MINUTE)
}
