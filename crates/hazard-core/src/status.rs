//! Hazard status and mode

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Lifecycle status of a hazard event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HazardStatus {
    #[default]
    Potential,
    Pending,
    Proposed,
    Issued,
    Ending,
    Ended,
    Elapsed,
}

impl HazardStatus {
    /// All statuses in lifecycle order
    pub const ALL: [HazardStatus; 7] = [
        HazardStatus::Potential,
        HazardStatus::Pending,
        HazardStatus::Proposed,
        HazardStatus::Issued,
        HazardStatus::Ending,
        HazardStatus::Ended,
        HazardStatus::Elapsed,
    ];

    fn rank(self) -> u8 {
        match self {
            HazardStatus::Potential => 0,
            HazardStatus::Pending => 1,
            HazardStatus::Proposed => 2,
            HazardStatus::Issued => 3,
            HazardStatus::Ending => 4,
            HazardStatus::Ended => 5,
            HazardStatus::Elapsed => 5,
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(self) -> bool {
        matches!(self, HazardStatus::Ended | HazardStatus::Elapsed)
    }

    /// Whether the event is (or was) live in an issued product
    pub fn is_active(self) -> bool {
        matches!(self, HazardStatus::Issued | HazardStatus::Ending)
    }

    /// Check a transition
    ///
    /// Statuses move forward only. `Proposed -> Pending` is the one step back,
    /// allowed while the event has never been issued. `Elapsed` is reachable
    /// only from a live (issued or ending) event.
    pub fn can_transition_to(self, next: HazardStatus, ever_issued: bool) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (HazardStatus::Proposed, HazardStatus::Pending) => !ever_issued,
            (_, HazardStatus::Elapsed) => self.is_active(),
            _ => next.rank() > self.rank(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HazardStatus::Potential => "potential",
            HazardStatus::Pending => "pending",
            HazardStatus::Proposed => "proposed",
            HazardStatus::Issued => "issued",
            HazardStatus::Ending => "ending",
            HazardStatus::Ended => "ended",
            HazardStatus::Elapsed => "elapsed",
        }
    }
}

impl fmt::Display for HazardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        HazardStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::TypeError {
                expected: "hazard status".to_string(),
                got: s.to_string(),
            })
    }
}

/// Operating mode of the session that owns an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HazardMode {
    #[default]
    Operational,
    Practice,
    Test,
}

impl HazardMode {
    pub fn as_str(self) -> &'static str {
        match self {
            HazardMode::Operational => "operational",
            HazardMode::Practice => "practice",
            HazardMode::Test => "test",
        }
    }

    /// Products issued in test mode carry the test banner
    pub fn is_test(self) -> bool {
        matches!(self, HazardMode::Test)
    }
}

impl fmt::Display for HazardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HazardStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Potential.can_transition_to(Pending, false));
        assert!(Pending.can_transition_to(Issued, false));
        assert!(Issued.can_transition_to(Ending, true));
        assert!(Ending.can_transition_to(Ended, true));
        assert!(!Issued.can_transition_to(Pending, true));
        assert!(!Ending.can_transition_to(Issued, true));
    }

    #[test]
    fn test_proposed_back_to_pending_only_before_issuance() {
        assert!(Proposed.can_transition_to(Pending, false));
        assert!(!Proposed.can_transition_to(Pending, true));
    }

    #[test]
    fn test_elapsed_and_terminal() {
        assert!(Issued.can_transition_to(Elapsed, true));
        assert!(!Pending.can_transition_to(Elapsed, false));
        assert!(!Ended.can_transition_to(Issued, true));
        assert!(!Elapsed.can_transition_to(Ended, true));
        assert!(Ended.can_transition_to(Ended, true));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("ISSUED".parse::<HazardStatus>().unwrap(), Issued);
        assert!("bogus".parse::<HazardStatus>().is_err());
    }
}
