//! Entity descriptors and their optional capabilities.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::DataModContext;
use crate::data::DataSet;
use crate::error::Result;
use crate::mapping::FieldMapping;

/// Supplies default values merged under caller data on fixture creation.
///
/// Providers receive the context so defaults can be looked up from other
/// entities, for example the id of the last selected user.
pub trait DefaultsProvider: Send + Sync {
    /// Returns logical defaults for a fixture about to be created from `data`.
    fn defaults(&self, ctx: &DataModContext, data: &DataSet) -> Result<DataSet>;
}

impl<F> DefaultsProvider for F
where
    F: Fn(&DataModContext, &DataSet) -> Result<DataSet> + Send + Sync,
{
    fn defaults(&self, ctx: &DataModContext, data: &DataSet) -> Result<DataSet> {
        self(ctx, data)
    }
}

/// Fixed defaults, as declared in configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticDefaults(pub DataSet);

impl DefaultsProvider for StaticDefaults {
    fn defaults(&self, _ctx: &DataModContext, _data: &DataSet) -> Result<DataSet> {
        Ok(self.0.clone())
    }
}

/// One seed row.
///
/// Without a `table` the row targets the entity's base table and its keys are
/// logical field names. With a `table` the row is inserted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub data: Value,
}

impl SeedEntry {
    /// Seed row for the entity's own table.
    pub fn own(data: Value) -> Self {
        Self { table: None, data }
    }

    /// Seed row for another table, inserted without mapping.
    pub fn for_table(table: impl Into<String>, data: Value) -> Self {
        Self {
            table: Some(table.into()),
            data,
        }
    }
}

/// Seed rows declared by an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedData {
    pub entries: Vec<SeedEntry>,
}

impl SeedData {
    pub fn new(entries: Vec<SeedEntry>) -> Self {
        Self { entries }
    }
}

/// Declaration of one logical entity.
#[derive(Clone)]
pub struct EntityDescriptor {
    name: String,
    base_table: String,
    mapping: Arc<FieldMapping>,
    bridged_class: Option<String>,
    defaults: Option<Arc<dyn DefaultsProvider>>,
    seed_data: Option<SeedData>,
}

impl EntityDescriptor {
    /// Creates a descriptor with its own table and mapping.
    ///
    /// # Arguments
    /// * `name` - Entity identity, the identifier references resolve to
    /// * `base_table` - Physical table
    /// * `mapping` - Logical to physical field mapping
    pub fn new(name: impl Into<String>, base_table: impl Into<String>, mapping: FieldMapping) -> Self {
        Self {
            name: name.into(),
            base_table: base_table.into(),
            mapping: Arc::new(mapping),
            bridged_class: None,
            defaults: None,
            seed_data: None,
        }
    }

    /// Declares the entity bridgeable under `class`.
    pub fn bridged(mut self, class: impl Into<String>) -> Self {
        self.bridged_class = Some(class.into());
        self
    }

    /// Attaches a defaults provider.
    pub fn with_defaults(mut self, provider: impl DefaultsProvider + 'static) -> Self {
        self.defaults = Some(Arc::new(provider));
        self
    }

    /// Attaches seed data.
    pub fn with_seed_data(mut self, seed_data: SeedData) -> Self {
        self.seed_data = Some(seed_data);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity's own table, ignoring any bridge.
    pub fn declared_base_table(&self) -> &str {
        &self.base_table
    }

    /// The entity's own mapping, ignoring any bridge.
    pub fn declared_mapping(&self) -> &Arc<FieldMapping> {
        &self.mapping
    }

    pub fn bridged_class(&self) -> Option<&str> {
        self.bridged_class.as_deref()
    }

    pub fn defaults(&self) -> Option<&Arc<dyn DefaultsProvider>> {
        self.defaults.as_ref()
    }

    pub fn seed_data(&self) -> Option<&SeedData> {
        self.seed_data.as_ref()
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("base_table", &self.base_table)
            .field("mapping", &self.mapping)
            .field("bridged_class", &self.bridged_class)
            .field("has_defaults", &self.defaults.is_some())
            .field("seed_data", &self.seed_data)
            .finish()
    }
}
