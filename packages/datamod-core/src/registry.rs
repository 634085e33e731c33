//! Entity registry: scenario references to entity descriptors.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::entity::EntityDescriptor;
use crate::error::{DataModError, Result};

/// Mapping key whose value is prefixed to every unmapped reference.
pub const WILDCARD: &str = "*";

/// Namespace prefixed to references when neither an explicit entry nor a
/// wildcard applies.
pub const DEFAULT_NAMESPACE: &str = "DataMod::";

/// Reference table and catalog of loadable entity types.
///
/// The reference table is replaced wholesale by [`EntityRegistry::set_mapping`]
/// and published atomically, so a resolution in flight sees either the old or
/// the new table, never a mix.
#[derive(Debug)]
pub struct EntityRegistry {
    entities: RwLock<HashMap<String, Arc<EntityDescriptor>>>,
    mapping: ArcSwap<BTreeMap<String, String>>,
    default_namespace: String,
}

impl EntityRegistry {
    /// Creates an empty registry using [`DEFAULT_NAMESPACE`].
    pub fn new() -> Self {
        Self::with_default_namespace(DEFAULT_NAMESPACE)
    }

    /// Creates an empty registry with a custom default namespace.
    pub fn with_default_namespace(namespace: impl Into<String>) -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            mapping: ArcSwap::from_pointee(BTreeMap::new()),
            default_namespace: namespace.into(),
        }
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Adds a descriptor to the catalog under its name.
    ///
    /// # Returns
    /// The descriptor previously registered under the same name, if any.
    pub fn register_entity(&self, descriptor: EntityDescriptor) -> Option<Arc<EntityDescriptor>> {
        let name = descriptor.name().to_string();
        debug!(entity = %name, table = descriptor.declared_base_table(), "registering entity");
        self.entities.write().insert(name, Arc::new(descriptor))
    }

    /// Looks up a descriptor by its exact identifier.
    pub fn entity(&self, identifier: &str) -> Option<Arc<EntityDescriptor>> {
        self.entities.read().get(identifier).cloned()
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entities.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Descriptors that declare a bridged class.
    pub fn bridged_entities(&self) -> Vec<Arc<EntityDescriptor>> {
        self.entities
            .read()
            .values()
            .filter(|descriptor| descriptor.bridged_class().is_some())
            .cloned()
            .collect()
    }

    /// Replaces the whole reference table.
    pub fn set_mapping(&self, mapping: BTreeMap<String, String>) {
        info!(entries = mapping.len(), "data mod mapping replaced");
        self.mapping.store(Arc::new(mapping));
    }

    /// Current reference table.
    pub fn mapping(&self) -> Arc<BTreeMap<String, String>> {
        self.mapping.load_full()
    }

    /// Computes the identifier a reference stands for, without checking that
    /// it is registered.
    ///
    /// Order: explicit entry, then wildcard prefix, then default namespace.
    pub fn identifier_for(&self, reference: &str) -> String {
        identifier_in(&self.mapping.load(), &self.default_namespace, reference)
    }

    /// Resolves a scenario reference to a registered descriptor.
    ///
    /// # Errors
    /// `EntityNotFound` with the attempted identifier and a snapshot of the
    /// reference table when nothing is registered under the identifier.
    pub fn resolve(&self, reference: &str) -> Result<Arc<EntityDescriptor>> {
        let mapping = self.mapping.load_full();
        let identifier = identifier_in(&mapping, &self.default_namespace, reference);

        match self.entity(&identifier) {
            Some(descriptor) => {
                debug!(reference, identifier = %identifier, "resolved data mod");
                Ok(descriptor)
            }
            None => Err(DataModError::EntityNotFound {
                reference: reference.to_string(),
                identifier,
                registry: format!("{mapping:?}"),
            }),
        }
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn identifier_in(mapping: &BTreeMap<String, String>, namespace: &str, reference: &str) -> String {
    if let Some(explicit) = mapping.get(reference) {
        return explicit.clone();
    }
    match mapping.get(WILDCARD) {
        Some(prefix) => format!("{prefix}{reference}"),
        None => format!("{namespace}{reference}"),
    }
}
