//! Event-driven tool schema
//!
//! Entries name tools the host runs without a forecaster request: on a
//! time interval, on a frame change, or when a data layer updates.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What makes an event-driven tool run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    TimeInterval,
    FrameChange,
    DataLayerChange,
}

/// Kind of tool an entry runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolType {
    #[default]
    Recommender,
    ProductGenerator,
}

/// One event-driven trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDrivenToolEntry {
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub tool_type: ToolType,
    /// Tools to run, in order
    pub tool_identifiers: Vec<String>,
    /// Required for `TIME_INTERVAL`
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    /// Data types that fire a `DATA_LAYER_CHANGE`; empty means any
    #[serde(default)]
    pub data_types: Vec<String>,
}

impl EventDrivenToolEntry {
    pub fn every(minutes: u32, tools: &[&str]) -> Self {
        Self {
            trigger_type: TriggerType::TimeInterval,
            tool_type: ToolType::Recommender,
            tool_identifiers: tools.iter().map(|t| t.to_string()).collect(),
            interval_minutes: Some(minutes),
            data_types: Vec::new(),
        }
    }

    pub fn on_frame_change(tools: &[&str]) -> Self {
        Self {
            trigger_type: TriggerType::FrameChange,
            interval_minutes: None,
            ..Self::every(0, tools)
        }
    }

    pub fn on_data_layer_change(tools: &[&str], data_types: &[&str]) -> Self {
        Self {
            trigger_type: TriggerType::DataLayerChange,
            interval_minutes: None,
            data_types: data_types.iter().map(|t| t.to_string()).collect(),
            ..Self::every(0, tools)
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        if let Some(dup) = self.tool_identifiers.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(Error::InvalidEventDrivenConfig(format!(
                "tool {} listed twice in one {:?} entry",
                dup, self.trigger_type
            )));
        }
        if self.tool_identifiers.is_empty() {
            return Err(Error::InvalidEventDrivenConfig(format!(
                "{:?} entry names no tools",
                self.trigger_type
            )));
        }
        if self.trigger_type == TriggerType::TimeInterval && !self.interval_minutes.is_some_and(|m| m > 0) {
            return Err(Error::InvalidEventDrivenConfig(
                "TIME_INTERVAL entry needs a positive intervalMinutes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validated list of event-driven tool entries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDrivenTools {
    tools: Vec<EventDrivenToolEntry>,
}

impl EventDrivenTools {
    /// Validate and wrap entries
    ///
    /// At most one `FRAME_CHANGE` and one `DATA_LAYER_CHANGE` entry may
    /// appear; anything more is rejected.
    pub fn new(tools: Vec<EventDrivenToolEntry>) -> Result<Self> {
        for entry in &tools {
            entry.validate()?;
        }
        for trigger in [TriggerType::FrameChange, TriggerType::DataLayerChange] {
            let count = tools.iter().filter(|e| e.trigger_type == trigger).count();
            if count > 1 {
                log::error!(
                    "{} {:?} entries in event-driven tool configuration; undefined behavior, rejecting",
                    count,
                    trigger
                );
                return Err(Error::InvalidEventDrivenConfig(format!(
                    "more than one {:?} entry",
                    trigger
                )));
            }
        }
        Ok(Self { tools })
    }

    pub fn entries(&self) -> &[EventDrivenToolEntry] {
        &self.tools
    }

    pub fn by_trigger(&self, trigger: TriggerType) -> impl Iterator<Item = &EventDrivenToolEntry> {
        self.tools.iter().filter(move |e| e.trigger_type == trigger)
    }

    /// Append entries, validating the combined list
    pub fn extend(&mut self, more: Vec<EventDrivenToolEntry>) -> Result<()> {
        let mut combined = self.tools.clone();
        combined.extend(more);
        *self = Self::new(combined)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl<'de> Deserialize<'de> for EventDrivenTools {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            tools: Vec<EventDrivenToolEntry>,
        }
        let raw = Raw::deserialize(deserializer)?;
        EventDrivenTools::new(raw.tools).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_configuration() {
        let tools = EventDrivenTools::new(vec![
            EventDrivenToolEntry::every(1, &["ExpiredEvents"]),
            EventDrivenToolEntry::on_frame_change(&["FrameTool"]),
            EventDrivenToolEntry::on_data_layer_change(&["RiverTool"], &["riverPro"]),
        ])
        .unwrap();
        assert_eq!(tools.len(), 3);
        assert_eq!(tools.by_trigger(TriggerType::TimeInterval).count(), 1);
    }

    #[test]
    fn test_rejects_two_frame_change_entries() {
        let _ = env_logger::builder().is_test(true).try_init();
        let result = EventDrivenTools::new(vec![
            EventDrivenToolEntry::on_frame_change(&["A"]),
            EventDrivenToolEntry::on_frame_change(&["B"]),
        ]);
        assert!(matches!(result, Err(Error::InvalidEventDrivenConfig(_))));
    }

    #[test]
    fn test_rejects_duplicate_tool_identifiers() {
        let result = EventDrivenTools::new(vec![EventDrivenToolEntry::every(5, &["A", "A"])]);
        assert!(matches!(result, Err(Error::InvalidEventDrivenConfig(_))));
    }

    #[test]
    fn test_time_interval_needs_interval() {
        let mut entry = EventDrivenToolEntry::every(5, &["A"]);
        entry.interval_minutes = None;
        assert!(EventDrivenTools::new(vec![entry]).is_err());
    }

    #[test]
    fn test_extend_keeps_state_on_error() {
        let mut tools = EventDrivenTools::new(vec![EventDrivenToolEntry::on_frame_change(&["A"])]).unwrap();
        assert!(tools.extend(vec![EventDrivenToolEntry::on_frame_change(&["B"])]).is_err());
        assert_eq!(tools.len(), 1);
    }

    #[test]
    fn test_ron_rejects_two_data_layer_entries() {
        let content = r#"(tools: [
            (triggerType: DATA_LAYER_CHANGE, toolIdentifiers: ["A"]),
            (triggerType: DATA_LAYER_CHANGE, toolIdentifiers: ["B"]),
        ])"#;
        assert!(ron::from_str::<EventDrivenTools>(content).is_err());
    }
}
