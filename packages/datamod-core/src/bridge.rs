//! Bridge indirection for entities whose storage lives in another subsystem.
//!
//! A context holds at most one bridge. When one is registered, every entity
//! that declares a bridged class takes its table and mapping from the bridge
//! instead of its own declaration. Callers never look at the declaration
//! directly; they go through [`BridgeSlot::layout_for`].

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::entity::EntityDescriptor;
use crate::error::{DataModError, Result};
use crate::mapping::FieldMapping;

/// Supplies table and mapping for bridged classes.
pub trait Bridge: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Physical table for a bridged class.
    fn base_table(&self, bridged_class: &str) -> Option<String>;

    /// Field mapping for a bridged class.
    fn data_mapping(&self, bridged_class: &str) -> Option<Arc<FieldMapping>>;
}

/// Resolved storage location of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityLayout {
    pub base_table: String,
    pub mapping: Arc<FieldMapping>,
}

/// Table and mapping for one bridged class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgedLayout {
    pub base_table: String,
    pub mapping: FieldMapping,
}

/// Bridge backed by a fixed class table, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticBridge {
    name: String,
    classes: HashMap<String, (String, Arc<FieldMapping>)>,
}

impl StaticBridge {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: HashMap::new(),
        }
    }

    /// Adds the layout for a bridged class.
    pub fn with_class(
        mut self,
        class: impl Into<String>,
        base_table: impl Into<String>,
        mapping: FieldMapping,
    ) -> Self {
        self.classes
            .insert(class.into(), (base_table.into(), Arc::new(mapping)));
        self
    }
}

impl Bridge for StaticBridge {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_table(&self, bridged_class: &str) -> Option<String> {
        self.classes
            .get(bridged_class)
            .map(|(table, _)| table.clone())
    }

    fn data_mapping(&self, bridged_class: &str) -> Option<Arc<FieldMapping>> {
        self.classes
            .get(bridged_class)
            .map(|(_, mapping)| mapping.clone())
    }
}

struct RegisteredBridge(Box<dyn Bridge>);

/// Single bridge slot; the last registration wins.
#[derive(Default)]
pub struct BridgeSlot {
    current: ArcSwapOption<RegisteredBridge>,
}

impl BridgeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bridge`, replacing any previous one.
    ///
    /// # Arguments
    /// * `bridge` - Bridge to publish
    /// * `bridged` - Bridgeable entities known so far; the bridge must supply a
    ///   non-empty table and a mapping for each of them
    ///
    /// # Returns
    /// `Result<(), DataModError>`, `InvalidBridge` if the bridge falls short.
    /// A rejected bridge leaves the previous registration in place.
    pub fn register(&self, bridge: Box<dyn Bridge>, bridged: &[Arc<EntityDescriptor>]) -> Result<()> {
        for descriptor in bridged {
            if let Some(class) = descriptor.bridged_class() {
                bridged_layout(bridge.as_ref(), class)?;
            }
        }

        let name = bridge.name().to_string();
        let previous = self
            .current
            .swap(Some(Arc::new(RegisteredBridge(bridge))));
        match previous {
            Some(old) => warn!(bridge = %name, replaced = %old.0.name(), "bridge replaced"),
            None => info!(bridge = %name, "bridge registered"),
        }
        Ok(())
    }

    /// Clears the slot. Returns true if a bridge was registered.
    pub fn unregister(&self) -> bool {
        self.current.swap(None).is_some()
    }

    pub fn is_registered(&self) -> bool {
        self.current.load().is_some()
    }

    /// Name of the registered bridge, if any.
    pub fn registered_name(&self) -> Option<String> {
        self.current
            .load_full()
            .map(|registered| registered.0.name().to_string())
    }

    /// Resolves where `descriptor` is stored.
    ///
    /// Goes through the bridge when one is registered and the entity is
    /// bridgeable, otherwise returns the entity's own declaration.
    pub fn layout_for(&self, descriptor: &EntityDescriptor) -> Result<EntityLayout> {
        if let Some(class) = descriptor.bridged_class() {
            if let Some(registered) = self.current.load_full() {
                return bridged_layout(registered.0.as_ref(), class);
            }
        }

        Ok(EntityLayout {
            base_table: descriptor.declared_base_table().to_string(),
            mapping: descriptor.declared_mapping().clone(),
        })
    }
}

impl std::fmt::Debug for BridgeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeSlot")
            .field("registered", &self.registered_name())
            .finish()
    }
}

fn bridged_layout(bridge: &dyn Bridge, class: &str) -> Result<EntityLayout> {
    let invalid = |reason: String| DataModError::InvalidBridge {
        bridge: bridge.name().to_string(),
        reason,
    };

    let base_table = bridge
        .base_table(class)
        .filter(|table| !table.is_empty())
        .ok_or_else(|| invalid(format!("no base table for bridged class '{class}'")))?;
    let mapping = bridge
        .data_mapping(class)
        .ok_or_else(|| invalid(format!("no data mapping for bridged class '{class}'")))?;

    Ok(EntityLayout {
        base_table,
        mapping,
    })
}
