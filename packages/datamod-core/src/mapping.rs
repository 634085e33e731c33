//! Field mapping resolution.
//!
//! Every read and write path funnels through [`FieldMapping`] so that test
//! authors see one error shape for an undeclared field no matter which
//! operation tripped over it.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::data::DataSet;
use crate::error::{DataModError, Result};

/// Sentinel used in declarations for a passthrough field.
pub const PASSTHROUGH: &str = "*";

/// Physical target of one logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMapping {
    /// Stored under the given physical column
    Mapped(String),
    /// Tracked under its logical name, never written as a column
    Passthrough,
}

impl ColumnMapping {
    /// Parses the declaration form, where `"*"` marks a passthrough field.
    pub fn parse(target: &str) -> Self {
        if target == PASSTHROUGH {
            Self::Passthrough
        } else {
            Self::Mapped(target.to_string())
        }
    }

    /// Returns the declaration form.
    pub fn as_declared(&self) -> &str {
        match self {
            Self::Mapped(column) => column,
            Self::Passthrough => PASSTHROUGH,
        }
    }
}

/// Ordered logical field name to column mapping for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    fields: Vec<(String, ColumnMapping)>,
}

impl FieldMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from `(logical, declared)` pairs in declaration order.
    ///
    /// A repeated logical name replaces the earlier target in place.
    pub fn from_pairs<L, P, I>(pairs: I) -> Self
    where
        L: Into<String>,
        P: AsRef<str>,
        I: IntoIterator<Item = (L, P)>,
    {
        let mut mapping = Self::new();
        for (logical, declared) in pairs {
            mapping.insert(logical, ColumnMapping::parse(declared.as_ref()));
        }
        mapping
    }

    /// Adds or replaces a field.
    pub fn insert(&mut self, logical: impl Into<String>, target: ColumnMapping) {
        let logical = logical.into();
        match self.fields.iter_mut().find(|(name, _)| *name == logical) {
            Some(entry) => entry.1 = target,
            None => self.fields.push((logical, target)),
        }
    }

    /// Builder form of [`FieldMapping::insert`] for a mapped column.
    pub fn with(mut self, logical: impl Into<String>, column: impl Into<String>) -> Self {
        self.insert(logical, ColumnMapping::Mapped(column.into()));
        self
    }

    /// Builder form of [`FieldMapping::insert`] for a passthrough field.
    pub fn with_passthrough(mut self, logical: impl Into<String>) -> Self {
        self.insert(logical, ColumnMapping::Passthrough);
        self
    }

    /// Looks up the declared target of a logical field.
    pub fn get(&self, logical: &str) -> Option<&ColumnMapping> {
        self.fields
            .iter()
            .find(|(name, _)| name == logical)
            .map(|(_, target)| target)
    }

    /// Returns true if `logical` is declared.
    pub fn contains(&self, logical: &str) -> bool {
        self.get(logical).is_some()
    }

    /// Iterates declared fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnMapping)> {
        self.fields.iter().map(|(name, target)| (name.as_str(), target))
    }

    /// Logical field names in declaration order.
    pub fn logical_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolves a logical field to its declared target.
    ///
    /// # Arguments
    /// * `entity` - Entity name, used for diagnostics only
    /// * `logical` - Logical field name
    ///
    /// # Returns
    /// `Result<&ColumnMapping, DataModError>`; `UnmappedField` carries the full
    /// mapping when `logical` is not declared.
    pub fn resolve_field(&self, entity: &str, logical: &str) -> Result<&ColumnMapping> {
        self.get(logical)
            .ok_or_else(|| DataModError::UnmappedField {
                entity: entity.to_string(),
                key: logical.to_string(),
                available: self.to_string(),
            })
    }

    /// Resolves a logical field to the column used for value lookups.
    ///
    /// Passthrough fields resolve to their logical name.
    pub fn resolve_column(&self, entity: &str, logical: &str) -> Result<String> {
        Ok(match self.resolve_field(entity, logical)? {
            ColumnMapping::Mapped(column) => column.clone(),
            ColumnMapping::Passthrough => logical.to_string(),
        })
    }

    /// Resolves a logical field that must be backed by a physical column.
    pub fn resolve_physical(&self, entity: &str, logical: &str) -> Result<String> {
        match self.resolve_field(entity, logical)? {
            ColumnMapping::Mapped(column) => Ok(column.clone()),
            ColumnMapping::Passthrough => Err(DataModError::UnpersistedField {
                entity: entity.to_string(),
                key: logical.to_string(),
            }),
        }
    }

    /// Translates a data or values set into physical columns.
    ///
    /// Passthrough fields are dropped from the output. Fails on the first
    /// undeclared key without returning a partial translation.
    pub fn resolve_data_set(&self, entity: &str, data: &DataSet) -> Result<DataSet> {
        let mut resolved = DataSet::new();
        for (key, value) in data {
            if let ColumnMapping::Mapped(column) = self.resolve_field(entity, key)? {
                resolved.insert(column.clone(), value.clone());
            }
        }
        debug!(entity, fields = data.len(), resolved = resolved.len(), "resolved data set");
        Ok(resolved)
    }

    /// Translates selection criteria into physical columns.
    ///
    /// Unlike [`FieldMapping::resolve_data_set`], a passthrough key is an error:
    /// dropping it would silently widen the selection.
    pub fn resolve_criteria(&self, entity: &str, criteria: &DataSet) -> Result<DataSet> {
        let mut resolved = DataSet::new();
        for (key, value) in criteria {
            resolved.insert(self.resolve_physical(entity, key)?, value.clone());
        }
        Ok(resolved)
    }
}

impl fmt::Display for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (logical, target)) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{logical:?}: {:?}", target.as_declared())?;
        }
        f.write_str("}")
    }
}

impl Serialize for FieldMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (logical, target) in &self.fields {
            map.serialize_entry(logical, target.as_declared())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = FieldMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of logical field names to column names or \"*\"")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<FieldMapping, A::Error> {
                let mut mapping = FieldMapping::new();
                while let Some((logical, declared)) = access.next_entry::<String, String>()? {
                    mapping.insert(logical, ColumnMapping::parse(&declared));
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}
