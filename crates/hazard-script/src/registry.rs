//! Hazard metadata registry
//!
//! The registry is an ordered list of entries mapping hazard types to a
//! metadata source class name. Lookup walks the list and takes the first
//! entry that matches, so more specific entries must come first.

use crate::error::{Error, Result};
use crate::megawidget::{validate_tree, MutableProperties};
use crate::metadata::{ApplyOutcome, InterdependencyApplier, MetadataContext, MetadataResult, MetadataSource};
use crate::schema::HazardCategories;
use crate::sources;
use hazard_core::{HazardEvent, HazardEventView, HazardType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub hazard_types: Vec<HazardType>,
    /// `None` means the hazard types have no metadata
    #[serde(default)]
    pub class_name: Option<String>,
}

impl RegistryEntry {
    pub fn new(hazard_types: Vec<HazardType>, class_name: Option<&str>) -> Self {
        Self {
            hazard_types,
            class_name: class_name.map(str::to_string),
        }
    }

    /// An entry type without a subtype covers every subtype of its
    /// phenomenon and significance; a key without a subtype only matches
    /// entry types without one.
    pub fn matches(&self, key: &HazardType) -> bool {
        self.hazard_types.iter().any(|t| {
            t.phenomenon() == key.phenomenon()
                && t.significance() == key.significance()
                && (t.subtype().is_none() || t.subtype() == key.subtype())
        })
    }
}

/// Ordered hazard metadata registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRegistry {
    pub entries: Vec<RegistryEntry>,
}

impl MetadataRegistry {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: RegistryEntry) {
        self.entries.push(entry);
    }

    /// First entry whose hazard types match `key`
    pub fn lookup(&self, key: &HazardType) -> Option<&RegistryEntry> {
        let entry = self.entries.iter().find(|e| e.matches(key));
        log::debug!(
            "Metadata registry: {} -> {:?}",
            key,
            entry.map(|e| e.class_name.as_deref())
        );
        entry
    }

    /// Class name for `key`; `None` when unregistered or registered without a class
    pub fn class_for(&self, key: &HazardType) -> Option<&str> {
        self.lookup(key)?.class_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry plus the catalog of metadata sources it names
///
/// Failures to find or run a source never block hazard creation: the host
/// gets an empty tree and the failure is logged.
#[derive(Clone, Default)]
pub struct HazardMetadata {
    registry: MetadataRegistry,
    catalog: IndexMap<String, Arc<dyn MetadataSource>>,
    applier: InterdependencyApplier,
}

impl HazardMetadata {
    pub fn new(registry: MetadataRegistry) -> Self {
        Self {
            registry,
            catalog: IndexMap::new(),
            applier: InterdependencyApplier::default(),
        }
    }

    /// Registry with every shipped metadata source in the catalog
    pub fn with_builtin_sources(registry: MetadataRegistry, categories: &HazardCategories) -> Self {
        let mut metadata = Self::new(registry);
        for (name, source) in sources::builtin(categories) {
            metadata.register(name, source);
        }
        metadata
    }

    pub fn with_applier(mut self, applier: InterdependencyApplier) -> Self {
        self.applier = applier;
        self
    }

    pub fn register(&mut self, class_name: impl Into<String>, source: Arc<dyn MetadataSource>) {
        self.catalog.insert(class_name.into(), source);
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.catalog.keys().map(String::as_str)
    }

    /// Source registered under a class name
    pub fn source_named(&self, class_name: &str) -> Option<Arc<dyn MetadataSource>> {
        self.catalog.get(class_name).cloned()
    }

    /// Resolve the source for a hazard type
    ///
    /// `Ok(None)` when the type has no metadata; an error when the registry
    /// names a class the catalog does not have.
    pub fn try_source_for(&self, hazard_type: &HazardType) -> Result<Option<Arc<dyn MetadataSource>>> {
        let Some(class_name) = self.registry.class_for(hazard_type) else {
            return Ok(None);
        };
        self.source_named(class_name)
            .map(Some)
            .ok_or_else(|| Error::MetadataLoad(format!("{} (for {})", class_name, hazard_type)))
    }

    /// Like [`Self::try_source_for`], logging and dropping load failures
    pub fn source_for(&self, hazard_type: &HazardType) -> Option<Arc<dyn MetadataSource>> {
        match self.try_source_for(hazard_type) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("{}; using empty metadata", e);
                None
            }
        }
    }

    /// Run the event's metadata source, propagating every failure
    pub fn try_metadata_for(&self, event: &HazardEvent, context: &MetadataContext) -> Result<MetadataResult> {
        let Some(hazard_type) = event.hazard_type() else {
            return Ok(MetadataResult::empty());
        };
        let Some(source) = self.try_source_for(hazard_type)? else {
            return Ok(MetadataResult::empty());
        };
        let result = source
            .execute(event, context)
            .map_err(|e| Error::MetadataLoad(format!("{}: {}", hazard_type, e)))?;
        validate_tree(&result.metadata)?;
        Ok(result)
    }

    /// Megawidget tree for an event; empty on any failure
    pub fn metadata_for(&self, event: &HazardEvent, context: &MetadataContext) -> MetadataResult {
        self.try_metadata_for(event, context).unwrap_or_else(|e| {
            log::warn!("Metadata unavailable, showing defaults: {}", e);
            MetadataResult::empty()
        })
    }

    /// Apply the interdependencies of a hazard type's source
    ///
    /// Types without a source leave the snapshot as is.
    pub fn apply_interdependencies(
        &self,
        hazard_type: &HazardType,
        triggers: Option<&[String]>,
        properties: &MutableProperties,
    ) -> Result<ApplyOutcome> {
        match self.source_for(hazard_type) {
            Some(source) => self.applier.apply(source.as_ref(), triggers, properties),
            None => Ok(ApplyOutcome {
                properties: properties.clone(),
                rounds: 0,
                converged: true,
            }),
        }
    }
}

impl std::fmt::Debug for HazardMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HazardMetadata")
            .field("registry", &self.registry)
            .field("catalog", &self.catalog.keys().collect::<Vec<_>>())
            .finish()
    }
}
