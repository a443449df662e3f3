//! RON configuration loader

use crate::error::{Error, Result};
use crate::registry::{HazardMetadata, MetadataRegistry, RegistryEntry};
use crate::schema::{EventDrivenToolEntry, EventDrivenTools, HazardCategories, Settings, StartupConfig, VtecEntry, VtecTable};
use hazard_core::HazardType;
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_REGISTRY: &str = include_str!("../defaults/registry.ron");
const DEFAULT_SETTINGS: &str = include_str!("../defaults/settings.ron");
const DEFAULT_CATEGORIES: &str = include_str!("../defaults/categories.ron");
const DEFAULT_VTEC: &str = include_str!("../defaults/vtec.ron");
const DEFAULT_STARTUP: &str = include_str!("../defaults/startup.ron");
const DEFAULT_EVENT_DRIVEN: &str = include_str!("../defaults/event_driven.ron");

/// Loaded configuration tables
#[derive(Debug, Default)]
pub struct ConfigTables {
    /// Hazard metadata registry, in load order
    pub registry: MetadataRegistry,
    /// Settings by settings ID
    pub settings: IndexMap<String, Settings>,
    pub categories: HazardCategories,
    pub vtec: VtecTable,
    pub startup: Option<StartupConfig>,
    pub event_driven: EventDrivenTools,
}

impl ConfigTables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a settings definition
    pub fn get_settings(&self, id: &str) -> Option<&Settings> {
        self.settings.get(id)
    }

    /// Metadata registry wired to the shipped metadata sources
    pub fn hazard_metadata(&self) -> HazardMetadata {
        HazardMetadata::with_builtin_sources(self.registry.clone(), &self.categories)
    }

    /// Headline for a hazard type, from the VTEC table
    pub fn headline(&self, hazard_type: &HazardType) -> Option<&str> {
        self.vtec.headline(&hazard_type.phensig())
    }
}

/// Which table a configuration file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Registry,
    Settings,
    Categories,
    Vtec,
    Startup,
    EventDriven,
}

impl Table {
    fn from_filename(filename: &str) -> Option<Self> {
        [
            ("registry", Table::Registry),
            ("settings", Table::Settings),
            ("categor", Table::Categories),
            ("vtec", Table::Vtec),
            ("startup", Table::Startup),
            ("event_driven", Table::EventDriven),
        ]
        .into_iter()
        .find(|(stem, _)| filename.contains(stem))
        .map(|(_, table)| table)
    }

    fn from_content(content: &str) -> Option<Self> {
        [
            ("hazardTypes:", Table::Registry),
            ("settingsID:", Table::Settings),
            ("categories:", Table::Categories),
            ("phensigs:", Table::Vtec),
            ("possibleSites:", Table::Startup),
            ("triggerType:", Table::EventDriven),
        ]
        .into_iter()
        .find(|(key, _)| content.contains(key))
        .map(|(_, table)| table)
    }
}

/// Loader for RON configuration files
pub struct ConfigLoader {
    tables: ConfigTables,
}

impl ConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            tables: ConfigTables::new(),
        }
    }

    /// A loader holding the built-in tables
    pub fn with_defaults() -> Result<Self> {
        let mut loader = Self::new();
        loader.load_registry_str(DEFAULT_REGISTRY)?;
        loader.load_settings_str(DEFAULT_SETTINGS)?;
        loader.load_categories_str(DEFAULT_CATEGORIES)?;
        loader.load_vtec_str(DEFAULT_VTEC)?;
        loader.load_startup_str(DEFAULT_STARTUP)?;
        loader.load_event_driven_str(DEFAULT_EVENT_DRIVEN)?;
        Ok(loader)
    }

    /// Load a single RON file
    ///
    /// The table is picked from the filename. Only a file whose name matches
    /// no table is recognized by its content.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        let table = Table::from_filename(filename)
            .or_else(|| Table::from_content(&content))
            .ok_or_else(|| {
                Error::InvalidSchema(format!("Could not recognize configuration table in {:?}", path))
            })?;

        match table {
            Table::Registry => self.load_registry_str(&content),
            Table::Settings => self.load_settings_str(&content),
            Table::Categories => self.load_categories_str(&content),
            Table::Vtec => self.load_vtec_str(&content),
            Table::Startup => self.load_startup_str(&content),
            Table::EventDriven => self.load_event_driven_str(&content),
        }
    }

    /// Append registry entries from a RON string
    pub fn load_registry_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct RegistryFile {
            entries: Vec<RegistryEntry>,
        }

        let file: RegistryFile = ron::from_str(content)?;
        for entry in file.entries {
            if entry.hazard_types.is_empty() {
                return Err(Error::MissingField("hazardTypes".to_string()));
            }
            self.tables.registry.push(entry);
        }
        Ok(())
    }

    /// Load settings from a RON string
    pub fn load_settings_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct SettingsFile {
            settings: Vec<Settings>,
        }

        let file: SettingsFile = ron::from_str(content)?;
        for settings in file.settings {
            let id = settings.settings_id.clone();
            if self.tables.settings.contains_key(&id) {
                return Err(Error::DuplicateDefinition(id));
            }
            self.tables.settings.insert(id, settings);
        }
        Ok(())
    }

    /// Load hazard categories from a RON string
    pub fn load_categories_str(&mut self, content: &str) -> Result<()> {
        let file: HazardCategories = ron::from_str(content)?;
        for (name, types) in file.categories {
            if self.tables.categories.categories.contains_key(&name) {
                return Err(Error::DuplicateDefinition(name));
            }
            self.tables.categories.categories.insert(name, types);
        }
        Ok(())
    }

    /// Load VTEC table entries from a RON string
    pub fn load_vtec_str(&mut self, content: &str) -> Result<()> {
        let file: VtecTable = ron::from_str(content)?;
        for (phensig, entry) in file.phensigs {
            self.insert_vtec(phensig, entry)?;
        }
        Ok(())
    }

    fn insert_vtec(&mut self, phensig: String, entry: VtecEntry) -> Result<()> {
        if self.tables.vtec.phensigs.contains_key(&phensig) {
            return Err(Error::DuplicateDefinition(phensig));
        }
        self.tables.vtec.phensigs.insert(phensig, entry);
        Ok(())
    }

    /// Load the site startup configuration; only one may be loaded
    pub fn load_startup_str(&mut self, content: &str) -> Result<()> {
        let startup: StartupConfig = ron::from_str(content)?;
        startup.validate()?;
        if self.tables.startup.is_some() {
            return Err(Error::DuplicateDefinition("startup configuration".to_string()));
        }
        self.tables.startup = Some(startup);
        Ok(())
    }

    /// Load event-driven tool entries; the combined list is validated
    pub fn load_event_driven_str(&mut self, content: &str) -> Result<()> {
        #[derive(serde::Deserialize)]
        struct EventDrivenFile {
            tools: Vec<EventDrivenToolEntry>,
        }

        let file: EventDrivenFile = ron::from_str(content)?;
        self.tables.event_driven.extend(file.tools)
    }

    /// Load all RON files from a directory, in path order
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        // Registry order matters, so never rely on read_dir order
        let mut paths: Vec<PathBuf> = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        paths.sort();

        for file_path in paths {
            if file_path.extension().map(|e| e == "ron").unwrap_or(false) {
                self.load_file(&file_path)?;
            } else if file_path.is_dir() {
                self.load_directory(&file_path)?;
            }
        }

        Ok(())
    }

    /// Finish loading and return the tables
    pub fn finish(self) -> ConfigTables {
        self.tables
    }

    /// Get the current tables (for inspection during loading)
    pub fn tables(&self) -> &ConfigTables {
        &self.tables
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
