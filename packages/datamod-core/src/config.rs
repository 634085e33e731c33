//! Configuration for connection details, entity declarations and the
//! reference table.
//!
//! Supports TOML config files, environment variable overrides, and defaults.

use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bridge::{BridgedLayout, StaticBridge};
use crate::data::DataSet;
use crate::entity::{EntityDescriptor, SeedData, StaticDefaults};
use crate::error::{DataModError, Result};
use crate::mapping::{ColumnMapping, FieldMapping};
use crate::registry::DEFAULT_NAMESPACE;

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "DATAMOD_";

/// Database connection details handed to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Store engine, e.g. "memory" or "sqlite"
    pub engine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Declaration of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Entity identity, e.g. "DataMod::User"
    pub name: String,
    #[serde(default)]
    pub base_table: String,
    /// Logical to physical mapping, "*" for passthrough fields
    pub mapping: FieldMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridged_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<SeedData>,
}

impl EntityConfig {
    /// Builds the descriptor this declaration describes.
    pub fn to_descriptor(&self) -> EntityDescriptor {
        let mut descriptor =
            EntityDescriptor::new(&self.name, &self.base_table, self.mapping.clone());
        if let Some(class) = &self.bridged_class {
            descriptor = descriptor.bridged(class);
        }
        if let Some(defaults) = &self.defaults {
            descriptor = descriptor.with_defaults(StaticDefaults(defaults.clone()));
        }
        if let Some(seed) = &self.seed {
            descriptor = descriptor.with_seed_data(seed.clone());
        }
        descriptor
    }
}

/// Bridge declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub name: String,
    /// Layout per bridged class
    #[serde(default)]
    pub classes: BTreeMap<String, BridgedLayout>,
}

impl BridgeConfig {
    pub fn to_bridge(&self) -> StaticBridge {
        self.classes
            .iter()
            .fold(StaticBridge::new(&self.name), |bridge, (class, layout)| {
                bridge.with_class(class, &layout.base_table, layout.mapping.clone())
            })
    }
}

/// Top level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModConfig {
    pub connection: ConnectionConfig,
    /// Reference to identifier table; "*" holds a wildcard prefix
    #[serde(default)]
    pub data_mod_mapping: BTreeMap<String, String>,
    /// Namespace used when no mapping entry applies (default: "DataMod::")
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// Column truncate filters on with "!NULL" (default: "id")
    #[serde(default = "default_truncate_column")]
    pub truncate_column: String,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeConfig>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_truncate_column() -> String {
    "id".to_string()
}

impl DataModConfig {
    /// Creates a configuration for `engine` with default values.
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            connection: ConnectionConfig {
                engine: engine.into(),
                ..Default::default()
            },
            data_mod_mapping: BTreeMap::new(),
            default_namespace: default_namespace(),
            truncate_column: default_truncate_column(),
            entities: Vec::new(),
            bridge: None,
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DataModError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| DataModError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Serializes the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DataModError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Saves the configuration to a TOML file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let toml = self.to_toml()?;
        std::fs::write(path.as_ref(), toml)
            .map_err(|e| DataModError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    /// Applies environment variable overrides.
    /// Environment variables are prefixed with `DATAMOD_`.
    /// Example: `DATAMOD_DBNAME=/tmp/test.db` overrides `connection.dbname`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| env::var(format!("{ENV_PREFIX}{name}")).ok())
    }

    /// Applies overrides from `lookup`, which maps an unprefixed variable name
    /// (e.g. `ENGINE`) to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ENGINE") {
            self.connection.engine = val;
        }
        if let Some(val) = lookup("DBNAME") {
            self.connection.dbname = Some(val);
        }
        if let Some(val) = lookup("SCHEMA") {
            self.connection.schema = Some(val);
        }
        if let Some(val) = lookup("PREFIX") {
            self.connection.prefix = Some(val);
        }
        if let Some(val) = lookup("HOST") {
            self.connection.host = Some(val);
        }
        if let Some(val) = lookup("PORT") {
            self.connection.port = Some(
                val.parse()
                    .map_err(|_| DataModError::Config(format!("Invalid port: {}", val)))?,
            );
        }
        if let Some(val) = lookup("USERNAME") {
            self.connection.username = Some(val);
        }
        if let Some(val) = lookup("PASSWORD") {
            self.connection.password = Some(val);
        }
        if let Some(val) = lookup("DEFAULT_NAMESPACE") {
            self.default_namespace = val;
        }
        if let Some(val) = lookup("TRUNCATE_COLUMN") {
            self.truncate_column = val;
        }
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.connection.engine.trim().is_empty() {
            return Err(DataModError::Config("connection.engine must be set".to_string()));
        }
        if self.truncate_column.is_empty() {
            return Err(DataModError::Config("truncate_column must not be empty".to_string()));
        }

        for (reference, identifier) in &self.data_mod_mapping {
            if identifier.is_empty() {
                return Err(DataModError::Config(format!(
                    "data_mod_mapping entry '{}' has an empty target",
                    reference
                )));
            }
        }

        let mut names = HashSet::new();
        for entity in &self.entities {
            if entity.name.is_empty() {
                return Err(DataModError::Config("entity name must not be empty".to_string()));
            }
            if !names.insert(entity.name.as_str()) {
                return Err(DataModError::Config(format!(
                    "entity '{}' declared more than once",
                    entity.name
                )));
            }
            for (logical, target) in entity.mapping.iter() {
                if matches!(target, ColumnMapping::Mapped(column) if column.is_empty()) {
                    return Err(DataModError::Config(format!(
                        "entity '{}' maps '{}' to an empty column",
                        entity.name, logical
                    )));
                }
            }
        }

        if let Some(bridge) = &self.bridge {
            if bridge.name.is_empty() {
                return Err(DataModError::Config("bridge name must not be empty".to_string()));
            }
        }

        Ok(())
    }
}
