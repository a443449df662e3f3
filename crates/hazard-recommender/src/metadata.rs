//! Recommender script metadata and dialog descriptors

use hazard_core::{HazardStatus, HazardType, Value, ValueMap};
use hazard_script::Megawidget;
use serde::{Deserialize, Serialize};

/// Dialog input key naming the button that closed the dialog
pub const DISMISS_CHOICE_KEY: &str = "__dismissChoice__";

/// What a recommender tells the host about itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMetadata {
    pub tool_name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    /// Status new events are created in
    #[serde(default)]
    pub event_state: Option<HazardStatus>,
    #[serde(default)]
    pub get_dialog_info_needed: bool,
    #[serde(default)]
    pub get_spatial_info_needed: bool,
    /// Only events of these types are passed in; empty means all
    #[serde(default)]
    pub include_event_types: Vec<HazardType>,
    /// Only the events named by the trigger are passed in
    #[serde(default)]
    pub only_include_trigger_events: bool,
}

impl ScriptMetadata {
    pub fn new(tool_name: impl Into<String>, author: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            author: author.into(),
            version: version.into(),
            description: String::new(),
            event_state: None,
            get_dialog_info_needed: false,
            get_spatial_info_needed: false,
            include_event_types: Vec::new(),
            only_include_trigger_events: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_event_state(mut self, status: HazardStatus) -> Self {
        self.event_state = Some(status);
        self
    }

    pub fn with_dialog(mut self) -> Self {
        self.get_dialog_info_needed = true;
        self
    }

    pub fn with_spatial_info(mut self) -> Self {
        self.get_spatial_info_needed = true;
        self
    }

    pub fn including(mut self, types: Vec<HazardType>) -> Self {
        self.include_event_types = types;
        self
    }

    pub fn trigger_events_only(mut self) -> Self {
        self.only_include_trigger_events = true;
        self
    }

    /// Whether an event of this type is passed to the recommender
    ///
    /// An included type without a subtype covers all of its subtypes.
    pub fn includes(&self, hazard_type: Option<&HazardType>) -> bool {
        if self.include_event_types.is_empty() {
            return true;
        }
        hazard_type.is_some_and(|key| {
            self.include_event_types.iter().any(|t| {
                t.phensig() == key.phensig() && (t.subtype().is_none() || t.subtype() == key.subtype())
            })
        })
    }
}

/// A dialog button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogButton {
    pub identifier: String,
    pub label: String,
    /// Pressing the button closes the dialog
    #[serde(default)]
    pub close: bool,
    #[serde(default)]
    pub default: bool,
    /// Pressing the button cancels the run
    #[serde(default)]
    pub cancel: bool,
}

impl DialogButton {
    pub fn new(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            close: true,
            default: false,
            cancel: false,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn as_cancel(mut self) -> Self {
        self.cancel = true;
        self
    }
}

/// Dialog the host builds before running a recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogDescriptor {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<Megawidget>,
    #[serde(default)]
    pub buttons: Vec<DialogButton>,
}

impl DialogDescriptor {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            buttons: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Megawidget) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_button(mut self, button: DialogButton) -> Self {
        self.buttons.push(button);
        self
    }

    /// Whether the dialog input says a non-default cancel button closed it
    pub fn is_cancel(&self, dialog_input: &ValueMap) -> bool {
        let Some(choice) = dismiss_choice(dialog_input) else {
            return false;
        };
        self.buttons
            .iter()
            .any(|b| b.identifier == choice && b.cancel && !b.default)
    }
}

/// Identifier of the button that closed the dialog, if any
pub fn dismiss_choice(dialog_input: &ValueMap) -> Option<&str> {
    dialog_input.get(DISMISS_CHOICE_KEY).and_then(Value::as_str)
}
