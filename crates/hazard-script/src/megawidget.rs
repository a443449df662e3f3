//! Megawidget descriptors and their mutable properties
//!
//! A metadata source describes the forecaster dialog as a tree of
//! [`Megawidget`] nodes. Interdependency functions never see the tree; they
//! see a flat [`MutableProperties`] snapshot keyed by field name and answer
//! with a partial [`PropertyChanges`].

use crate::error::{Error, Result};
use hazard_core::{Value, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of megawidget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    TabbedComposite,
    Composite,
    Group,
    CheckList,
    CheckBox,
    CheckBoxes,
    ComboBox,
    RadioButtons,
    IntegerSpinner,
    FractionSpinner,
    TimeScale,
    Text,
    Label,
    HiddenField,
}

impl FieldType {
    /// Whether nodes of this type hold child widgets
    pub fn is_container(self) -> bool {
        matches!(
            self,
            FieldType::TabbedComposite | FieldType::Composite | FieldType::Group
        )
    }
}

/// One selectable choice; choices may nest to form a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub identifier: String,
    #[serde(default)]
    pub display_string: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Choice>,
}

impl Choice {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_string: None,
            children: Vec::new(),
        }
    }

    pub fn labeled(identifier: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            display_string: Some(display.into()),
            ..Self::new(identifier)
        }
    }

    pub fn with_children(mut self, children: Vec<Choice>) -> Self {
        self.children = children;
        self
    }

    /// This choice's identifier and all of its descendants'
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids = vec![self.identifier.clone()];
        for child in &self.children {
            ids.extend(child.identifiers());
        }
        ids
    }
}

/// A megawidget descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Megawidget {
    pub field_type: FieldType,
    pub field_name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    /// Default value(s)
    #[serde(default)]
    pub values: Option<Value>,
    #[serde(default)]
    pub enable: Option<bool>,
    #[serde(default)]
    pub editable: Option<bool>,
    /// Per-state editability of multi-valued widgets
    #[serde(default)]
    pub value_editables: Option<ValueMap>,
    #[serde(default)]
    pub extra_data: Option<ValueMap>,
    /// Layout hints, passed through to the host
    #[serde(default, skip_serializing_if = "ValueMap::is_empty")]
    pub hints: ValueMap,
    /// Children of container widgets, in display order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Megawidget>,
}

impl Megawidget {
    pub fn new(field_type: FieldType, field_name: impl Into<String>) -> Self {
        Self {
            field_type,
            field_name: field_name.into(),
            label: None,
            choices: Vec::new(),
            values: None,
            enable: None,
            editable: None,
            value_editables: None,
            extra_data: None,
            hints: ValueMap::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_values(mut self, values: impl Into<Value>) -> Self {
        self.values = Some(values.into());
        self
    }

    pub fn with_enable(mut self, enable: bool) -> Self {
        self.enable = Some(enable);
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn with_value_editables(mut self, editables: ValueMap) -> Self {
        self.value_editables = Some(editables);
        self
    }

    pub fn with_extra_data(mut self, extra: ValueMap) -> Self {
        self.extra_data = Some(extra);
        self
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.hints.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<Megawidget>) -> Self {
        self.fields = fields;
        self
    }

    /// Depth-first walk over this node and its descendants
    pub fn walk(&self) -> Vec<&Megawidget> {
        let mut out = vec![self];
        for child in &self.fields {
            out.extend(child.walk());
        }
        out
    }

    /// Snapshot of this widget's mutable properties
    pub fn properties(&self) -> WidgetProperties {
        WidgetProperties {
            values: self.values.clone(),
            enable: self.enable,
            editable: self.editable,
            choices: (!self.choices.is_empty()).then(|| self.choices.clone()),
            value_editables: self.value_editables.clone(),
            extra_data: self.extra_data.clone(),
        }
    }

    fn apply(&mut self, props: &WidgetProperties) {
        self.values = props.values.clone();
        self.enable = props.enable;
        self.editable = props.editable;
        if let Some(choices) = &props.choices {
            self.choices = choices.clone();
        }
        self.value_editables = props.value_editables.clone();
        self.extra_data = props.extra_data.clone();
    }
}

/// Check that field names are unique across a whole tree
pub fn validate_tree(tree: &[Megawidget]) -> Result<()> {
    let mut seen = HashSet::new();
    for widget in tree.iter().flat_map(Megawidget::walk) {
        if !seen.insert(widget.field_name.as_str()) {
            return Err(Error::DuplicateFieldName(widget.field_name.clone()));
        }
    }
    Ok(())
}

/// Find a widget anywhere in a tree
pub fn find_widget<'a>(tree: &'a [Megawidget], field_name: &str) -> Option<&'a Megawidget> {
    tree.iter()
        .flat_map(Megawidget::walk)
        .find(|w| w.field_name == field_name)
}

/// Write a snapshot back into a tree
pub fn apply_properties(tree: &mut [Megawidget], properties: &MutableProperties) {
    for widget in tree.iter_mut() {
        if let Some(props) = properties.get(&widget.field_name) {
            widget.apply(props);
        }
        apply_properties(&mut widget.fields, properties);
    }
}

/// Mutable properties of one widget
///
/// In a [`PropertyChanges`] mapping every field is partial: `None` leaves the
/// current property alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetProperties {
    #[serde(default)]
    pub values: Option<Value>,
    #[serde(default)]
    pub enable: Option<bool>,
    #[serde(default)]
    pub editable: Option<bool>,
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub value_editables: Option<ValueMap>,
    #[serde(default)]
    pub extra_data: Option<ValueMap>,
}

impl WidgetProperties {
    pub fn values(values: impl Into<Value>) -> Self {
        Self {
            values: Some(values.into()),
            ..Self::default()
        }
    }

    pub fn with_values(mut self, values: impl Into<Value>) -> Self {
        self.values = Some(values.into());
        self
    }

    pub fn with_enable(mut self, enable: bool) -> Self {
        self.enable = Some(enable);
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn with_value_editable(mut self, state: impl Into<String>, editable: bool) -> Self {
        self.value_editables
            .get_or_insert_with(ValueMap::new)
            .insert(state.into(), Value::Bool(editable));
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_data
            .get_or_insert_with(ValueMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// One state of a multi-valued widget
    pub fn state_value(&self, state: &str) -> Option<&Value> {
        self.values.as_ref()?.as_map()?.get(state)
    }

    pub fn value_editable(&self, state: &str) -> Option<bool> {
        self.value_editables.as_ref()?.get(state)?.as_bool()
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra_data.as_ref()?.get(key)
    }

    /// Merge a partial update into these properties
    ///
    /// Map-valued `values`, `valueEditables` and `extraData` merge key by
    /// key; everything else is replaced when present in `partial`.
    pub fn merge(&mut self, partial: &WidgetProperties) {
        if let Some(values) = &partial.values {
            match (self.values.as_mut().and_then(Value::as_map_mut), values.as_map()) {
                (Some(current), Some(update)) => {
                    for (k, v) in update {
                        current.insert(k.clone(), v.clone());
                    }
                }
                _ => self.values = Some(values.clone()),
            }
        }
        if partial.enable.is_some() {
            self.enable = partial.enable;
        }
        if partial.editable.is_some() {
            self.editable = partial.editable;
        }
        if partial.choices.is_some() {
            self.choices = partial.choices.clone();
        }
        merge_map(&mut self.value_editables, &partial.value_editables);
        merge_map(&mut self.extra_data, &partial.extra_data);
    }
}

fn merge_map(target: &mut Option<ValueMap>, update: &Option<ValueMap>) {
    if let Some(update) = update {
        let target = target.get_or_insert_with(ValueMap::new);
        for (k, v) in update {
            target.insert(k.clone(), v.clone());
        }
    }
}

/// Partial updates keyed by field name
pub type PropertyChanges = IndexMap<String, WidgetProperties>;

/// Snapshot of every widget's mutable properties, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutableProperties(IndexMap<String, WidgetProperties>);

impl MutableProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a whole tree
    pub fn from_tree(tree: &[Megawidget]) -> Self {
        Self(
            tree.iter()
                .flat_map(Megawidget::walk)
                .map(|w| (w.field_name.clone(), w.properties()))
                .collect(),
        )
    }

    pub fn get(&self, field_name: &str) -> Option<&WidgetProperties> {
        self.0.get(field_name)
    }

    pub fn get_mut(&mut self, field_name: &str) -> Option<&mut WidgetProperties> {
        self.0.get_mut(field_name)
    }

    pub fn insert(&mut self, field_name: impl Into<String>, props: WidgetProperties) {
        self.0.insert(field_name.into(), props);
    }

    /// Current `values` of a widget
    pub fn values(&self, field_name: &str) -> Option<&Value> {
        self.0.get(field_name)?.values.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WidgetProperties)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge partial changes; unknown field names gain a new entry
    pub fn merge(&mut self, changes: &PropertyChanges) {
        for (name, partial) in changes {
            self.0.entry(name.clone()).or_default().merge(partial);
        }
    }

    /// Names of widgets whose `values` differ from `other`
    pub fn changed_values(&self, other: &MutableProperties) -> Vec<String> {
        self.0
            .iter()
            .filter(|(name, props)| other.values(name) != props.values.as_ref())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<Megawidget> {
        vec![Megawidget::new(FieldType::Composite, "main").with_fields(vec![
            Megawidget::new(FieldType::CheckBox, "flag").with_values(false),
            Megawidget::new(FieldType::TimeScale, "times")
                .with_values(ValueMap::from_iter([
                    ("crest".to_string(), Value::Int(1000)),
                    ("fallBelow".to_string(), Value::Int(4600)),
                ]))
                .with_value_editables(ValueMap::from_iter([("fallBelow".to_string(), Value::Bool(true))])),
        ])]
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        assert!(validate_tree(&tree()).is_ok());
        let mut bad = tree();
        bad.push(Megawidget::new(FieldType::Text, "flag"));
        assert!(matches!(validate_tree(&bad), Err(Error::DuplicateFieldName(name)) if name == "flag"));
    }

    #[test]
    fn test_partial_merge_keeps_other_state() {
        let mut props = MutableProperties::from_tree(&tree());
        assert_eq!(props.len(), 3);

        let mut changes = PropertyChanges::new();
        changes.insert(
            "times".to_string(),
            WidgetProperties::values(ValueMap::from_iter([("fallBelow".to_string(), Value::Int(9000))]))
                .with_value_editable("fallBelow", false),
        );
        let before = props.clone();
        props.merge(&changes);

        let times = props.get("times").unwrap();
        assert_eq!(times.state_value("crest"), Some(&Value::Int(1000)));
        assert_eq!(times.state_value("fallBelow"), Some(&Value::Int(9000)));
        assert_eq!(times.value_editable("fallBelow"), Some(false));
        assert_eq!(props.changed_values(&before), vec!["times".to_string()]);
    }

    #[test]
    fn test_apply_properties_to_tree() {
        let mut tree = tree();
        let mut props = MutableProperties::from_tree(&tree);
        props.merge(&PropertyChanges::from_iter([(
            "flag".to_string(),
            WidgetProperties::values(true).with_enable(false),
        )]));
        apply_properties(&mut tree, &props);
        let flag = find_widget(&tree, "flag").unwrap();
        assert_eq!(flag.values, Some(Value::Bool(true)));
        assert_eq!(flag.enable, Some(false));
    }

    #[test]
    fn test_descriptor_from_ron() {
        let widget: Megawidget = ron::from_str(
            r#"(
                fieldType: ComboBox,
                fieldName: "rainAmt",
                label: Some("Rain so far:"),
                choices: [(identifier: "one", displayString: Some("One inch"))],
                values: Some(String("one")),
            )"#,
        )
        .unwrap();
        assert_eq!(widget.field_type, FieldType::ComboBox);
        assert_eq!(widget.choices[0].identifier, "one");
        assert!(widget.fields.is_empty());
    }
}
