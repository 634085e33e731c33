//! Coordinating context and per-entity operations.
//!
//! [`DataModContext`] owns everything the original design kept in process
//! wide statics: the entity registry, the bridge slot and saved sessions. One
//! context per test run keeps runs isolated. [`DataMod`] is the handle a
//! resolved entity hands out; all per-entity operations live on it.

mod accessor;
mod fixture;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::bridge::{Bridge, BridgeSlot, EntityLayout};
use crate::config::DataModConfig;
use crate::data::DataSet;
use crate::entity::EntityDescriptor;
use crate::error::{DataModError, Result};
use crate::mapping::FieldMapping;
use crate::registry::EntityRegistry;
use crate::session::SessionStore;
use crate::store::Store;

/// Column `truncate` filters on when none is configured.
pub const DEFAULT_TRUNCATE_COLUMN: &str = "id";

/// Holds the store, registry, bridge slot and saved sessions for one run.
pub struct DataModContext {
    store: Arc<dyn Store>,
    registry: EntityRegistry,
    bridge: BridgeSlot,
    sessions: SessionStore,
    truncate_column: String,
}

impl DataModContext {
    /// Creates a context with an empty registry.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_registry(store, EntityRegistry::new())
    }

    /// Creates a context around an existing registry.
    pub fn with_registry(store: Arc<dyn Store>, registry: EntityRegistry) -> Self {
        Self {
            store,
            registry,
            bridge: BridgeSlot::new(),
            sessions: SessionStore::new(),
            truncate_column: DEFAULT_TRUNCATE_COLUMN.to_string(),
        }
    }

    /// Sets the column `truncate` filters on.
    pub fn with_truncate_column(mut self, column: impl Into<String>) -> Self {
        self.truncate_column = column.into();
        self
    }

    /// Builds a context from validated configuration.
    ///
    /// Registers every declared entity, installs the reference table and, if
    /// configured, registers the bridge.
    pub fn from_config(config: &DataModConfig, store: Arc<dyn Store>) -> Result<Self> {
        config.validate()?;

        let registry = EntityRegistry::with_default_namespace(&config.default_namespace);
        for entity in &config.entities {
            registry.register_entity(entity.to_descriptor());
        }
        registry.set_mapping(config.data_mod_mapping.clone());

        let context =
            Self::with_registry(store, registry).with_truncate_column(&config.truncate_column);
        if let Some(bridge) = &config.bridge {
            context.register_bridge(bridge.to_bridge())?;
        }
        Ok(context)
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn truncate_column(&self) -> &str {
        &self.truncate_column
    }

    /// Adds an entity type to the registry catalog.
    pub fn register_entity(&self, descriptor: EntityDescriptor) {
        self.registry.register_entity(descriptor);
    }

    /// Replaces the reference table.
    pub fn set_mapping(&self, mapping: BTreeMap<String, String>) {
        self.registry.set_mapping(mapping);
    }

    /// Registers the bridge, replacing any previous one.
    ///
    /// # Errors
    /// `InvalidBridge` if the bridge cannot supply a table and mapping for a
    /// bridgeable entity already in the registry.
    pub fn register_bridge(&self, bridge: impl Bridge + 'static) -> Result<()> {
        self.bridge
            .register(Box::new(bridge), &self.registry.bridged_entities())
    }

    /// Removes the registered bridge. Returns true if one was registered.
    pub fn unregister_bridge(&self) -> bool {
        self.bridge.unregister()
    }

    pub fn bridge(&self) -> &BridgeSlot {
        &self.bridge
    }

    /// Resolves a scenario reference to an entity handle.
    pub fn resolve(&self, reference: &str) -> Result<DataMod<'_>> {
        let descriptor = self.registry.resolve(reference)?;
        Ok(DataMod {
            ctx: self,
            descriptor,
        })
    }

    /// Looks up an entity by its exact identifier, bypassing the reference
    /// table.
    pub fn entity(&self, identifier: &str) -> Result<DataMod<'_>> {
        let descriptor =
            self.registry
                .entity(identifier)
                .ok_or_else(|| DataModError::EntityNotFound {
                    reference: identifier.to_string(),
                    identifier: identifier.to_string(),
                    registry: format!("{:?}", self.registry.identifiers()),
                })?;
        Ok(DataMod {
            ctx: self,
            descriptor,
        })
    }

    /// Table and mapping for `descriptor`, through the bridge when it applies.
    pub fn layout_for(&self, descriptor: &EntityDescriptor) -> Result<EntityLayout> {
        self.bridge.layout_for(descriptor)
    }

    /// Base table for `descriptor`, through the bridge when it applies.
    pub fn base_table_for(&self, descriptor: &EntityDescriptor) -> Result<String> {
        Ok(self.layout_for(descriptor)?.base_table)
    }

    /// Field mapping for `descriptor`, through the bridge when it applies.
    pub fn data_mapping_for(&self, descriptor: &EntityDescriptor) -> Result<Arc<FieldMapping>> {
        Ok(self.layout_for(descriptor)?.mapping)
    }

    /// Builds a sub-select reference from physical names, without mapping.
    pub fn raw_sub_select(&self, table: &str, column: &str, criteria: &DataSet) -> Result<String> {
        Ok(self
            .store
            .build_sub_select_reference(table, column, criteria)?)
    }

    /// Inserts seed data for every registered entity that declares some, in
    /// identifier order.
    ///
    /// # Returns
    /// Number of seed rows inserted.
    pub fn insert_all_seed_data(&self) -> Result<usize> {
        let mut inserted = 0;
        for identifier in self.registry.identifiers() {
            inserted += self.entity(&identifier)?.insert_seed_data()?.len();
        }
        Ok(inserted)
    }
}

impl std::fmt::Debug for DataModContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataModContext")
            .field("registry", &self.registry)
            .field("bridge", &self.bridge)
            .field("sessions", &self.sessions.len())
            .field("truncate_column", &self.truncate_column)
            .finish()
    }
}

/// Handle to one resolved entity within a context.
#[derive(Clone)]
pub struct DataMod<'a> {
    ctx: &'a DataModContext,
    descriptor: Arc<EntityDescriptor>,
}

impl<'a> DataMod<'a> {
    /// Entity identity.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Arc<EntityDescriptor> {
        &self.descriptor
    }

    pub fn context(&self) -> &'a DataModContext {
        self.ctx
    }

    /// Resolved table and mapping, with the base table guaranteed non-empty.
    ///
    /// # Errors
    /// `MissingBaseTable` when the table resolves empty.
    pub fn layout(&self) -> Result<EntityLayout> {
        let layout = self.ctx.layout_for(&self.descriptor)?;
        if layout.base_table.trim().is_empty() {
            return Err(DataModError::MissingBaseTable {
                entity: self.name().to_string(),
            });
        }
        Ok(layout)
    }

    /// Selects matching records; values become available through
    /// [`DataMod::get_value`].
    pub fn select(&self, criteria: &DataSet) -> Result<()> {
        let layout = self.layout()?;
        let resolved = layout.mapping.resolve_criteria(self.name(), criteria)?;
        debug!(entity = self.name(), table = %layout.base_table, "select");
        self.ctx.store.select(&layout.base_table, &resolved)?;
        Ok(())
    }

    /// Inserts a record and returns the store's generated identity.
    pub fn insert(&self, data: &DataSet) -> Result<serde_json::Value> {
        let layout = self.layout()?;
        let resolved = layout.mapping.resolve_data_set(self.name(), data)?;
        debug!(entity = self.name(), table = %layout.base_table, "insert");
        self.ctx.store.insert(&layout.base_table, &resolved)?;
        Ok(self.ctx.store.last_insert_id()?)
    }

    /// Updates matching records.
    pub fn update(&self, values: &DataSet, criteria: &DataSet) -> Result<()> {
        let layout = self.layout()?;
        let resolved_values = layout.mapping.resolve_data_set(self.name(), values)?;
        let resolved_criteria = layout.mapping.resolve_criteria(self.name(), criteria)?;
        debug!(entity = self.name(), table = %layout.base_table, "update");
        self.ctx
            .store
            .update(&layout.base_table, &resolved_values, &resolved_criteria)?;
        Ok(())
    }

    /// Deletes matching records.
    pub fn delete(&self, criteria: &DataSet) -> Result<()> {
        let layout = self.layout()?;
        let resolved = layout.mapping.resolve_criteria(self.name(), criteria)?;
        debug!(entity = self.name(), table = %layout.base_table, "delete");
        self.ctx.store.delete(&layout.base_table, &resolved)?;
        Ok(())
    }

    /// Deletes every record whose truncate column is not null.
    ///
    /// The filter uses the physical truncate column, not the mapping.
    pub fn truncate(&self) -> Result<()> {
        let layout = self.layout()?;
        let mut criteria = DataSet::new();
        criteria.insert(
            self.ctx.truncate_column.clone(),
            serde_json::Value::String("!NULL".to_string()),
        );
        debug!(entity = self.name(), table = %layout.base_table, "truncate");
        self.ctx.store.delete(&layout.base_table, &criteria)?;
        Ok(())
    }
}

impl std::fmt::Debug for DataMod<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataMod")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
