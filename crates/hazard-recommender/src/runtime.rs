//! Recommender runtime
//!
//! One run goes through four phases:
//! 1. build the input event set from a snapshot of the store
//! 2. execute the recommender against that copy
//! 3. collect the result into a write set and check all of it
//! 4. apply the writes, save as the result flags ask, settle locks
//!
//! A failure in phases 1-3 leaves the store as it was.

use crate::error::{Error, Result};
use crate::metadata::{DialogDescriptor, ScriptMetadata};
use crate::recommender::Recommender;
use crate::write_set::WriteSet;
use hazard_core::event_set::{HAZARD_MODE, SITE_ID, TRIGGER, TRIGGER_IDENTIFIERS};
use hazard_core::{
    EventId, EventSet, HazardEvent, HazardEventStore, HazardEventView, HazardMode, Instant, LockService, Value,
    ValueMap, VisualFeature,
};
use hazard_script::TriggerType;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

/// What caused a recommender run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Trigger {
    /// Run by the forecaster
    #[default]
    None,
    /// An event the recommender watches was modified
    HazardEventModification,
    TimeInterval,
    FrameChange,
    DataLayerChange,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::None => "none",
            Trigger::HazardEventModification => "hazardEventModification",
            Trigger::TimeInterval => "timeInterval",
            Trigger::FrameChange => "frameChange",
            Trigger::DataLayerChange => "dataLayerChange",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TriggerType> for Trigger {
    fn from(trigger: TriggerType) -> Self {
        match trigger {
            TriggerType::TimeInterval => Trigger::TimeInterval,
            TriggerType::FrameChange => Trigger::FrameChange,
            TriggerType::DataLayerChange => Trigger::DataLayerChange,
        }
    }
}

/// Everything the host passes to one run
#[derive(Debug, Clone)]
pub struct RecommenderInput {
    pub current_time: Instant,
    pub hazard_mode: HazardMode,
    /// Selected events; empty means every event in the store
    pub selected: Vec<EventId>,
    pub trigger: Trigger,
    /// Identifiers of whatever fired the trigger
    pub trigger_identifiers: Vec<String>,
    pub dialog_input: ValueMap,
    pub spatial_input: Vec<VisualFeature>,
}

impl RecommenderInput {
    pub fn new(current_time: Instant) -> Self {
        Self {
            current_time,
            hazard_mode: HazardMode::default(),
            selected: Vec::new(),
            trigger: Trigger::None,
            trigger_identifiers: Vec::new(),
            dialog_input: ValueMap::new(),
            spatial_input: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: HazardMode) -> Self {
        self.hazard_mode = mode;
        self
    }

    pub fn with_selected(mut self, selected: Vec<EventId>) -> Self {
        self.selected = selected;
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger, identifiers: Vec<String>) -> Self {
        self.trigger = trigger;
        self.trigger_identifiers = identifiers;
        self
    }

    pub fn with_dialog_input(mut self, dialog_input: ValueMap) -> Self {
        self.dialog_input = dialog_input;
        self
    }

    pub fn with_spatial_input(mut self, features: Vec<VisualFeature>) -> Self {
        self.spatial_input = features;
        self
    }
}

/// What a completed run did to the session
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderOutcome {
    pub tool: String,
    pub created: Vec<EventId>,
    pub modified: Vec<EventId>,
    /// Where the result asks the time cursor to move
    pub selected_time: Option<Instant>,
    pub saved_to_history: bool,
    pub saved_to_database: bool,
}

impl RecommenderOutcome {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.selected_time.is_none()
    }
}

/// Registered recommenders plus the set of tools currently running
#[derive(Default)]
pub struct RecommenderRuntime {
    tools: IndexMap<String, Arc<dyn Recommender>>,
    running: Mutex<HashSet<String>>,
}

/// Marks a tool as running until dropped
struct RunGuard<'a> {
    running: &'a Mutex<HashSet<String>>,
    tool: String,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.tool);
    }
}

impl RecommenderRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime with every shipped recommender registered
    pub fn with_builtin() -> Self {
        let mut runtime = Self::new();
        for (identifier, tool) in crate::recommenders::builtin() {
            runtime.register(identifier, tool);
        }
        runtime
    }

    /// Register a recommender; a later registration replaces an earlier one
    pub fn register(&mut self, identifier: impl Into<String>, tool: Arc<dyn Recommender>) {
        self.tools.insert(identifier.into(), tool);
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.tools.contains_key(identifier)
    }

    fn tool(&self, identifier: &str) -> Result<&Arc<dyn Recommender>> {
        self.tools
            .get(identifier)
            .ok_or_else(|| Error::UnknownTool(identifier.to_string()))
    }

    pub fn metadata(&self, identifier: &str) -> Result<ScriptMetadata> {
        Ok(self.tool(identifier)?.metadata())
    }

    /// Dialog to show before running, if the tool asks for one
    pub fn dialog_for(&self, identifier: &str, events: &EventSet) -> Result<Option<DialogDescriptor>> {
        let tool = self.tool(identifier)?;
        if !tool.metadata().get_dialog_info_needed {
            return Ok(None);
        }
        Ok(tool.define_dialog(events))
    }

    /// Features to show before running, if the tool asks for them
    pub fn spatial_info_for(&self, identifier: &str) -> Result<Vec<VisualFeature>> {
        let tool = self.tool(identifier)?;
        if !tool.metadata().get_spatial_info_needed {
            return Ok(Vec::new());
        }
        Ok(tool.define_spatial_info())
    }

    /// Build the event set a tool would be handed
    pub fn input_events(
        &self,
        identifier: &str,
        input: &RecommenderInput,
        store: &HazardEventStore,
    ) -> Result<EventSet> {
        let metadata = self.metadata(identifier)?;
        let snapshot: Vec<HazardEvent> = if input.selected.is_empty() {
            store.iter().cloned().collect()
        } else {
            input
                .selected
                .iter()
                .map(|id| {
                    store
                        .get(id)
                        .cloned()
                        .ok_or_else(|| hazard_core::Error::EventNotFound(id.to_string()))
                })
                .collect::<std::result::Result<_, _>>()?
        };

        let mut events: EventSet = snapshot
            .into_iter()
            .filter(|e| metadata.includes(e.hazard_type()))
            .filter(|e| {
                !metadata.only_include_trigger_events
                    || e.event_id()
                        .is_some_and(|id| input.trigger_identifiers.iter().any(|t| t == id.as_str()))
            })
            .collect();

        events.set_current_time(input.current_time);
        events.add_attribute(SITE_ID, store.site_id().as_str());
        events.add_attribute(HAZARD_MODE, input.hazard_mode.as_str());
        events.add_attribute(TRIGGER, input.trigger.as_str());
        events.add_attribute(TRIGGER_IDENTIFIERS, Value::from(input.trigger_identifiers.clone()));
        Ok(events)
    }

    fn begin(&self, identifier: &str) -> Result<RunGuard<'_>> {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !running.insert(identifier.to_string()) {
            return Err(Error::AlreadyRunning(identifier.to_string()));
        }
        Ok(RunGuard {
            running: &self.running,
            tool: identifier.to_string(),
        })
    }

    /// Run a recommender and apply its result to the store
    ///
    /// Either every event in the result is applied or none is.
    pub fn run(
        &self,
        identifier: &str,
        input: RecommenderInput,
        store: &mut HazardEventStore,
        locks: &dyn LockService,
    ) -> Result<RecommenderOutcome> {
        let tool = Arc::clone(self.tool(identifier)?);
        let _guard = self.begin(identifier)?;
        let metadata = tool.metadata();

        let events = self.input_events(identifier, &input, store)?;
        log::debug!(
            "Running {} ({} events, trigger {})",
            identifier,
            events.len(),
            input.trigger
        );

        let result = tool
            .execute(&events, &input.dialog_input, &input.spatial_input)
            .map_err(|e| match e {
                Error::Execution { .. } => e,
                other => Error::Execution {
                    tool: identifier.to_string(),
                    reason: other.to_string(),
                },
            })?;

        let selected_time = result.require_time(hazard_core::event_set::SELECTED_TIME).map_err(|e| {
            Error::InvalidResult {
                tool: identifier.to_string(),
                reason: e.to_string(),
            }
        })?;
        let to_history = result.save_to_history();
        let to_database = result.save_to_database();
        let keep_locked = result.keep_saved_to_database_locked();

        let writes = WriteSet::collect(identifier, result.into_events(), metadata.event_state, store, locks)?;
        let (created, modified) = writes.apply(store)?;

        if to_history || to_database {
            for id in created.iter().chain(&modified) {
                if to_history {
                    store.save_to_history(id)?;
                } else {
                    store.save_to_database(id)?;
                }
                let settled = if keep_locked { locks.lock(id) } else { locks.unlock(id) };
                if let Err(e) = settled {
                    log::warn!("{}: could not settle lock on {}: {}", identifier, id, e);
                }
            }
        }

        log::info!(
            "{} finished: {} created, {} modified",
            identifier,
            created.len(),
            modified.len()
        );

        Ok(RecommenderOutcome {
            tool: identifier.to_string(),
            created,
            modified,
            selected_time,
            saved_to_history: to_history,
            saved_to_database: to_database,
        })
    }
}

impl fmt::Debug for RecommenderRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecommenderRuntime")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
