//! Metadata sources and the interdependency applier

use crate::error::{Error, Result};
use crate::megawidget::{Megawidget, MutableProperties, PropertyChanges};
use hazard_core::time::Instant;
use hazard_core::{HazardEvent, HazardMode, SiteId, Value, ValueMap};

/// Session facts available to metadata sources
#[derive(Debug, Clone)]
pub struct MetadataContext {
    pub current_time: Instant,
    pub site_id: SiteId,
    pub hazard_mode: HazardMode,
    /// Anything else the host passes along, e.g. forecast-point data
    pub attributes: ValueMap,
}

impl MetadataContext {
    pub fn new(current_time: Instant, site_id: SiteId) -> Self {
        Self {
            current_time,
            site_id,
            hazard_mode: HazardMode::Operational,
            attributes: ValueMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Output of a metadata source
#[derive(Debug, Clone, Default)]
pub struct MetadataResult {
    /// Megawidget tree shown to the forecaster
    pub metadata: Vec<Megawidget>,
    /// The event, initialized for first display, if the source changed it
    pub modified_event: Option<HazardEvent>,
}

impl MetadataResult {
    pub fn new(metadata: Vec<Megawidget>) -> Self {
        Self {
            metadata,
            modified_event: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

/// Per-hazard-type metadata
///
/// `apply_interdependencies` must be a pure function of its inputs.
pub trait MetadataSource: Send + Sync {
    /// Build the megawidget tree for an event
    fn execute(&self, event: &HazardEvent, context: &MetadataContext) -> Result<MetadataResult>;

    /// Recompute widget properties after a change
    ///
    /// `triggers` names the widgets whose values changed, or is `None` on
    /// initial population. Returns `None` when nothing needs to change.
    fn apply_interdependencies(
        &self,
        _triggers: Option<&[String]>,
        _properties: &MutableProperties,
    ) -> Result<Option<PropertyChanges>> {
        Ok(None)
    }
}

/// Outcome of a bounded interdependency run
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub properties: MutableProperties,
    /// Rounds in which the source was consulted
    pub rounds: usize,
    /// False when the round cap stopped iteration
    pub converged: bool,
}

/// Runs an interdependency function to a fixed point
#[derive(Debug, Clone, Copy)]
pub struct InterdependencyApplier {
    max_rounds: usize,
}

impl Default for InterdependencyApplier {
    fn default() -> Self {
        Self { max_rounds: 8 }
    }
}

impl InterdependencyApplier {
    pub fn new(max_rounds: usize) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Apply a source's interdependencies to a snapshot
    ///
    /// The first round sees the caller's triggers; each later round sees the
    /// widgets whose values the previous round changed. Iteration stops when
    /// the source has nothing to change, the snapshot stops changing, or the
    /// source repeats its previous answer. On error `properties` is left as
    /// it was.
    pub fn apply(
        &self,
        source: &dyn MetadataSource,
        triggers: Option<&[String]>,
        properties: &MutableProperties,
    ) -> Result<ApplyOutcome> {
        let mut current = properties.clone();
        let mut triggers: Option<Vec<String>> = triggers.map(<[String]>::to_vec);
        let mut previous: Option<PropertyChanges> = None;

        for round in 1..=self.max_rounds {
            let changes = source
                .apply_interdependencies(triggers.as_deref(), &current)
                .map_err(|e| Error::Interdependency(e.to_string()))?;

            let Some(changes) = changes else {
                return Ok(Self::converged(current, round));
            };
            if previous.as_ref() == Some(&changes) {
                return Ok(Self::converged(current, round));
            }

            let mut next = current.clone();
            next.merge(&changes);
            if next == current {
                return Ok(Self::converged(current, round));
            }

            let changed = next.changed_values(&current);
            current = next;
            if changed.is_empty() {
                return Ok(Self::converged(current, round));
            }
            log::debug!("Interdependency round {} changed {:?}", round, changed);
            triggers = Some(changed);
            previous = Some(changes);
        }

        log::warn!(
            "Interdependencies did not settle within {} rounds; keeping last state",
            self.max_rounds
        );
        Ok(ApplyOutcome {
            properties: current,
            rounds: self.max_rounds,
            converged: false,
        })
    }

    fn converged(properties: MutableProperties, rounds: usize) -> ApplyOutcome {
        ApplyOutcome {
            properties,
            rounds,
            converged: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::megawidget::WidgetProperties;

    /// `b` mirrors `a`; `c` mirrors `b`
    struct Chain;

    impl MetadataSource for Chain {
        fn execute(&self, _: &HazardEvent, _: &MetadataContext) -> Result<MetadataResult> {
            Ok(MetadataResult::empty())
        }

        fn apply_interdependencies(
            &self,
            triggers: Option<&[String]>,
            props: &MutableProperties,
        ) -> Result<Option<PropertyChanges>> {
            let triggers = triggers.unwrap_or_default();
            let mut changes = PropertyChanges::new();
            if triggers.iter().any(|t| t == "a") {
                changes.insert("b".into(), WidgetProperties::values(props.values("a").cloned().unwrap_or_default()));
            }
            if triggers.iter().any(|t| t == "b") {
                changes.insert("c".into(), WidgetProperties::values(props.values("b").cloned().unwrap_or_default()));
            }
            Ok((!changes.is_empty()).then_some(changes))
        }
    }

    /// Toggles `a` every round
    struct Flipper;

    impl MetadataSource for Flipper {
        fn execute(&self, _: &HazardEvent, _: &MetadataContext) -> Result<MetadataResult> {
            Ok(MetadataResult::empty())
        }

        fn apply_interdependencies(
            &self,
            _: Option<&[String]>,
            props: &MutableProperties,
        ) -> Result<Option<PropertyChanges>> {
            let a = props.values("a").and_then(Value::as_bool).unwrap_or(false);
            Ok(Some(PropertyChanges::from_iter([("a".to_string(), WidgetProperties::values(!a))])))
        }
    }

    struct Failing;

    impl MetadataSource for Failing {
        fn execute(&self, _: &HazardEvent, _: &MetadataContext) -> Result<MetadataResult> {
            Ok(MetadataResult::empty())
        }

        fn apply_interdependencies(&self, _: Option<&[String]>, _: &MutableProperties) -> Result<Option<PropertyChanges>> {
            Err(Error::InvalidSchema("boom".into()))
        }
    }

    fn snapshot() -> MutableProperties {
        let mut props = MutableProperties::new();
        for name in ["a", "b", "c"] {
            props.insert(name, WidgetProperties::values(0));
        }
        props.get_mut("a").unwrap().values = Some(Value::Int(5));
        props
    }

    #[test]
    fn test_chain_reaches_fixed_point() {
        let triggers = vec!["a".to_string()];
        let outcome = InterdependencyApplier::default()
            .apply(&Chain, Some(&triggers), &snapshot())
            .unwrap();
        assert!(outcome.converged);
        assert!(outcome.rounds <= 3);
        assert_eq!(outcome.properties.values("c"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_cycle_is_capped() {
        let outcome = InterdependencyApplier::new(4).apply(&Flipper, None, &snapshot()).unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.rounds, 4);
    }

    #[test]
    fn test_repeatable() {
        let triggers = vec!["a".to_string()];
        let applier = InterdependencyApplier::default();
        let first = applier.apply(&Chain, Some(&triggers), &snapshot()).unwrap();
        let second = applier.apply(&Chain, Some(&triggers), &snapshot()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_error_leaves_snapshot() {
        let props = snapshot();
        let result = InterdependencyApplier::default().apply(&Failing, None, &props);
        assert!(matches!(result, Err(Error::Interdependency(_))));
        assert_eq!(props, snapshot());
    }
}
