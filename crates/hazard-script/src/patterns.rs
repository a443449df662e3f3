//! Interdependency patterns shared by metadata sources
//!
//! Each pattern is a small, pure rule over a [`MutableProperties`] snapshot.
//! Sources combine them with [`merge_changes`].

use crate::megawidget::{Choice, MutableProperties, PropertyChanges, WidgetProperties};
use hazard_core::time::{is_until_further_notice_millis, UNTIL_FURTHER_NOTICE_MILLIS};
use hazard_core::{Value, ValueMap};
use indexmap::IndexMap;

/// Interval restored when no earlier interval was saved: one hour, in ms
pub const DEFAULT_INTERVAL_MILLIS: i64 = 3_600_000;

/// Extra-data key holding the interval saved before pinning a time
pub const LAST_INTERVAL: &str = "lastInterval";

fn triggered(triggers: Option<&[String]>, name: &str) -> bool {
    triggers.map_or(true, |t| t.iter().any(|x| x == name))
}

/// Combine change sets; later sets win per property
pub fn merge_changes(sets: impl IntoIterator<Item = Option<PropertyChanges>>) -> Option<PropertyChanges> {
    let mut merged = PropertyChanges::new();
    for set in sets.into_iter().flatten() {
        for (name, partial) in set {
            merged.entry(name).or_default().merge(&partial);
        }
    }
    (!merged.is_empty()).then_some(merged)
}

/// A choice selector that presets a numeric field
///
/// Choosing an entry with a preset sets the field to it and disables the
/// field; choosing an entry without one enables the field for free entry.
#[derive(Debug, Clone)]
pub struct PresetSelector<'a> {
    pub selector: &'a str,
    pub field: &'a str,
    pub presets: &'a [(&'a str, Option<f64>)],
}

impl PresetSelector<'_> {
    pub fn apply(&self, triggers: Option<&[String]>, props: &MutableProperties) -> Option<PropertyChanges> {
        if !triggered(triggers, self.selector) {
            return None;
        }
        let choice = props.values(self.selector)?.as_str()?;
        let (_, preset) = self.presets.iter().find(|(id, _)| *id == choice)?;
        let update = match preset {
            Some(value) => WidgetProperties::values(*value).with_enable(false),
            None => WidgetProperties::default().with_enable(true),
        };
        Some(PropertyChanges::from_iter([(self.field.to_string(), update)]))
    }
}

/// An "until further notice" checkbox pinning one state of a time scale
///
/// Checking pins `state` to the sentinel, makes it read-only and saves the
/// interval from `anchor`. Unchecking restores `anchor` plus the saved
/// interval (or [`DEFAULT_INTERVAL_MILLIS`]) and makes it editable again.
#[derive(Debug, Clone)]
pub struct UntilFurtherNotice<'a> {
    pub checkbox: &'a str,
    pub time_scale: &'a str,
    pub state: &'a str,
    pub anchor: &'a str,
}

impl UntilFurtherNotice<'_> {
    pub fn apply(&self, triggers: Option<&[String]>, props: &MutableProperties) -> Option<PropertyChanges> {
        if !triggered(triggers, self.checkbox) {
            return None;
        }
        let checked = props
            .values(self.checkbox)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let scale = props.get(self.time_scale)?;
        let current = scale.state_value(self.state).and_then(Value::as_int)?;
        let pinned = is_until_further_notice_millis(current);

        let update = if checked {
            if pinned && scale.value_editable(self.state) == Some(false) {
                return None;
            }
            let mut update = WidgetProperties::values(ValueMap::from_iter([(
                self.state.to_string(),
                Value::Int(UNTIL_FURTHER_NOTICE_MILLIS),
            )]))
            .with_value_editable(self.state, false);
            if !pinned {
                let anchor = scale.state_value(self.anchor).and_then(Value::as_int)?;
                update = update.with_extra(LAST_INTERVAL, current - anchor);
            }
            update
        } else if pinned {
            let anchor = scale.state_value(self.anchor).and_then(Value::as_int)?;
            let interval = scale
                .extra(LAST_INTERVAL)
                .and_then(Value::as_int)
                .unwrap_or(DEFAULT_INTERVAL_MILLIS);
            WidgetProperties::values(ValueMap::from_iter([(
                self.state.to_string(),
                Value::Int(anchor + interval),
            )]))
            .with_value_editable(self.state, true)
        } else if scale.value_editable(self.state) == Some(false) {
            WidgetProperties::default().with_value_editable(self.state, true)
        } else {
            return None;
        };
        Some(PropertyChanges::from_iter([(self.time_scale.to_string(), update)]))
    }
}

/// Category toggles that add and remove choice groups from a tree
///
/// `toggle` holds the list of enabled categories; `tree` shows one choice
/// group per enabled category, and its selected values are pruned to the
/// choices still shown.
#[derive(Debug, Clone)]
pub struct ChoiceGroupToggle<'a> {
    pub toggle: &'a str,
    pub tree: &'a str,
    pub groups: &'a IndexMap<String, Choice>,
}

impl ChoiceGroupToggle<'_> {
    pub fn apply(&self, triggers: Option<&[String]>, props: &MutableProperties) -> Option<PropertyChanges> {
        if !triggered(triggers, self.toggle) {
            return None;
        }
        let enabled = props.values(self.toggle).map(Value::as_string_list).unwrap_or_default();
        let choices: Vec<Choice> = self
            .groups
            .iter()
            .filter(|(category, _)| enabled.contains(category))
            .map(|(_, group)| group.clone())
            .collect();
        let visible: Vec<String> = choices.iter().flat_map(Choice::identifiers).collect();

        let tree = props.get(self.tree)?;
        let selected = tree.values.as_ref().map(Value::as_string_list).unwrap_or_default();
        let kept: Vec<String> = selected.into_iter().filter(|id| visible.contains(id)).collect();

        let update = WidgetProperties::values(kept).with_choices(choices);
        let unchanged =
            tree.choices.as_ref() == update.choices.as_ref() && tree.values.as_ref() == update.values.as_ref();
        (!unchanged).then(|| PropertyChanges::from_iter([(self.tree.to_string(), update)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flood_props(checked: bool) -> MutableProperties {
        let mut props = MutableProperties::new();
        props.insert("fallBelowUntilFurtherNotice", WidgetProperties::values(checked));
        props.insert(
            "riseAbove:crest:fallBelow",
            WidgetProperties::values(ValueMap::from_iter([
                ("crest".to_string(), Value::Int(1000)),
                ("fallBelow".to_string(), Value::Int(4600)),
            ]))
            .with_value_editable("fallBelow", true),
        );
        props
    }

    const UFN: UntilFurtherNotice<'static> = UntilFurtherNotice {
        checkbox: "fallBelowUntilFurtherNotice",
        time_scale: "riseAbove:crest:fallBelow",
        state: "fallBelow",
        anchor: "crest",
    };

    #[test]
    fn test_until_further_notice_toggle() {
        let triggers = vec!["fallBelowUntilFurtherNotice".to_string()];
        let mut props = flood_props(true);

        let changes = UFN.apply(Some(&triggers), &props).unwrap();
        props.merge(&changes);
        let scale = props.get("riseAbove:crest:fallBelow").unwrap();
        assert_eq!(scale.state_value("fallBelow"), Some(&Value::Int(2_147_483_647_000)));
        assert_eq!(scale.value_editable("fallBelow"), Some(false));
        assert_eq!(scale.extra(LAST_INTERVAL), Some(&Value::Int(3600)));

        // Pinned and read-only already: nothing more to do
        assert!(UFN.apply(Some(&triggers), &props).is_none());

        props.get_mut("fallBelowUntilFurtherNotice").unwrap().values = Some(Value::Bool(false));
        let changes = UFN.apply(Some(&triggers), &props).unwrap();
        props.merge(&changes);
        let scale = props.get("riseAbove:crest:fallBelow").unwrap();
        assert_eq!(scale.state_value("fallBelow"), Some(&Value::Int(4600)));
        assert_eq!(scale.value_editable("fallBelow"), Some(true));
    }

    #[test]
    fn test_until_further_notice_default_interval() {
        let mut props = flood_props(false);
        props.get_mut("riseAbove:crest:fallBelow").unwrap().values = Some(Value::Map(ValueMap::from_iter([
            ("crest".to_string(), Value::Int(1000)),
            ("fallBelow".to_string(), Value::Int(UNTIL_FURTHER_NOTICE_MILLIS)),
        ])));
        let changes = UFN.apply(None, &props).unwrap();
        props.merge(&changes);
        let scale = props.get("riseAbove:crest:fallBelow").unwrap();
        assert_eq!(scale.state_value("fallBelow"), Some(&Value::Int(1000 + DEFAULT_INTERVAL_MILLIS)));
    }

    #[test]
    fn test_untriggered_is_no_op() {
        let triggers = vec!["other".to_string()];
        assert!(UFN.apply(Some(&triggers), &flood_props(true)).is_none());
    }

    #[test]
    fn test_preset_selector() {
        let presets = [("one", Some(1.0)), ("two", Some(2.0)), ("custom", None)];
        let selector = PresetSelector {
            selector: "rainAmt",
            field: "rainSoFar",
            presets: &presets,
        };
        let mut props = MutableProperties::new();
        props.insert("rainAmt", WidgetProperties::values("two"));
        props.insert("rainSoFar", WidgetProperties::values(0.0).with_enable(true));

        let changes = selector.apply(None, &props).unwrap();
        assert_eq!(changes["rainSoFar"].values, Some(Value::Float(2.0)));
        assert_eq!(changes["rainSoFar"].enable, Some(false));

        props.insert("rainAmt", WidgetProperties::values("custom"));
        let changes = selector.apply(None, &props).unwrap();
        assert_eq!(changes["rainSoFar"].values, None);
        assert_eq!(changes["rainSoFar"].enable, Some(true));
    }

    #[test]
    fn test_choice_group_toggle() {
        let groups = IndexMap::from_iter([
            (
                "Hydrology".to_string(),
                Choice::new("Hydrology").with_children(vec![Choice::new("FL.W"), Choice::new("FA.Y")]),
            ),
            (
                "Winter".to_string(),
                Choice::new("Winter").with_children(vec![Choice::new("WS.W")]),
            ),
        ]);
        let toggle = ChoiceGroupToggle {
            toggle: "categories",
            tree: "hazardTypes",
            groups: &groups,
        };
        let mut props = MutableProperties::new();
        props.insert("categories", WidgetProperties::values(vec!["Hydrology"]));
        props.insert("hazardTypes", WidgetProperties::values(vec!["FL.W", "WS.W"]));

        let changes = toggle.apply(None, &props).unwrap();
        props.merge(&changes);
        let tree = props.get("hazardTypes").unwrap();
        assert_eq!(tree.choices.as_ref().unwrap().len(), 1);
        assert_eq!(tree.values, Some(Value::from(vec!["FL.W"])));
        assert!(toggle.apply(None, &props).is_none());
    }

    #[test]
    fn test_merge_changes() {
        let a = PropertyChanges::from_iter([("x".to_string(), WidgetProperties::values(1))]);
        let b = PropertyChanges::from_iter([("x".to_string(), WidgetProperties::default().with_enable(false))]);
        let merged = merge_changes([Some(a), None, Some(b)]).unwrap();
        assert_eq!(merged["x"].values, Some(Value::Int(1)));
        assert_eq!(merged["x"].enable, Some(false));
        assert!(merge_changes([None, None]).is_none());
    }
}
