//! Event-driven tool scheduling
//!
//! Answers which configured tools fire for a clock tick, a frame change, or
//! a data-layer update. The host runs the returned tools one at a time.

use crate::runtime::Trigger;
use hazard_core::Instant;
use hazard_script::{EventDrivenTools, ToolType, TriggerType};
use std::collections::HashMap;

/// Tools one trigger asks the host to run
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledRun {
    pub trigger: Trigger,
    pub tool_type: ToolType,
    pub tool_identifiers: Vec<String>,
}

/// Tracks when each time-interval entry last fired
#[derive(Debug, Clone, Default)]
pub struct EventDrivenScheduler {
    tools: EventDrivenTools,
    /// Last firing time by entry index
    last_run: HashMap<usize, Instant>,
}

impl EventDrivenScheduler {
    pub fn new(tools: EventDrivenTools) -> Self {
        Self {
            tools,
            last_run: HashMap::new(),
        }
    }

    pub fn tools(&self) -> &EventDrivenTools {
        &self.tools
    }

    /// Time-interval entries that are due at `now`
    ///
    /// An entry fires on the first tick it sees, then again once its
    /// interval has passed since it last fired.
    pub fn due_on_tick(&mut self, now: Instant) -> Vec<ScheduledRun> {
        let mut due = Vec::new();
        for (index, entry) in self.tools.entries().iter().enumerate() {
            if entry.trigger_type != TriggerType::TimeInterval {
                continue;
            }
            let Some(minutes) = entry.interval_minutes else {
                continue;
            };
            let fires = match self.last_run.get(&index) {
                Some(last) => now.signed_duration_since(*last).num_minutes() >= i64::from(minutes),
                None => true,
            };
            if fires {
                self.last_run.insert(index, now);
                due.push(ScheduledRun {
                    trigger: Trigger::TimeInterval,
                    tool_type: entry.tool_type,
                    tool_identifiers: entry.tool_identifiers.clone(),
                });
            }
        }
        if !due.is_empty() {
            log::debug!("Tick at {}: {} entries due", now, due.len());
        }
        due
    }

    pub fn on_frame_change(&self) -> Option<ScheduledRun> {
        self.tools
            .by_trigger(TriggerType::FrameChange)
            .next()
            .map(|entry| ScheduledRun {
                trigger: Trigger::FrameChange,
                tool_type: entry.tool_type,
                tool_identifiers: entry.tool_identifiers.clone(),
            })
    }

    /// Tools to run when `data_type` updates; an entry without data types
    /// fires for every update
    pub fn on_data_layer_change(&self, data_type: &str) -> Option<ScheduledRun> {
        self.tools
            .by_trigger(TriggerType::DataLayerChange)
            .find(|entry| entry.data_types.is_empty() || entry.data_types.iter().any(|t| t == data_type))
            .map(|entry| ScheduledRun {
                trigger: Trigger::DataLayerChange,
                tool_type: entry.tool_type,
                tool_identifiers: entry.tool_identifiers.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hazard_script::EventDrivenToolEntry;

    fn scheduler() -> EventDrivenScheduler {
        EventDrivenScheduler::new(
            EventDrivenTools::new(vec![
                EventDrivenToolEntry::every(5, &["ExpiredEvents"]),
                EventDrivenToolEntry::every(60, &["ExtendEvents"]),
                EventDrivenToolEntry::on_frame_change(&["FrameTool"]),
                EventDrivenToolEntry::on_data_layer_change(&["RiverTool"], &["riverPro"]),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_interval_entries_fire_on_schedule() {
        let mut scheduler = scheduler();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(scheduler.due_on_tick(t0).len(), 2);
        assert!(scheduler.due_on_tick(t0 + Duration::minutes(4)).is_empty());

        let due = scheduler.due_on_tick(t0 + Duration::minutes(5));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].tool_identifiers, vec!["ExpiredEvents".to_string()]);
        assert_eq!(due[0].trigger, Trigger::TimeInterval);

        assert_eq!(scheduler.due_on_tick(t0 + Duration::minutes(60)).len(), 2);
    }

    #[test]
    fn test_frame_and_data_layer_triggers() {
        let scheduler = scheduler();
        let frame = scheduler.on_frame_change().unwrap();
        assert_eq!(frame.tool_identifiers, vec!["FrameTool".to_string()]);

        assert!(scheduler.on_data_layer_change("radar").is_none());
        let river = scheduler.on_data_layer_change("riverPro").unwrap();
        assert_eq!(river.trigger, Trigger::DataLayerChange);
    }
}
