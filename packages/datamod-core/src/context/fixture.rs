//! Fixture lifecycle: create, assert and seed.

use serde_json::Value;
use tracing::{debug, info};

use super::DataMod;
use crate::data::DataSet;
use crate::entity::{DefaultsProvider, SeedEntry};
use crate::error::{DataModError, Result};

impl DataMod<'_> {
    /// Creates a fixture row and returns its generated identity.
    ///
    /// # Arguments
    /// * `data` - Logical field values; these win over provider defaults
    /// * `unique_column` - Logical field identifying the fixture; any existing
    ///   row with the same value is deleted first
    ///
    /// # Returns
    /// The store's last insert id.
    ///
    /// The delete and the insert are separate store calls. A failure between
    /// them leaves neither the old nor the new row.
    pub fn create_fixture(&self, data: &DataSet, unique_column: Option<&str>) -> Result<Value> {
        let layout = self.layout()?;

        if let Some(column) = unique_column {
            let value = data
                .get(column)
                .ok_or_else(|| DataModError::MissingUniqueColumnValue {
                    entity: self.name().to_string(),
                    column: column.to_string(),
                })?;

            let mut criteria = DataSet::new();
            criteria.insert(column.to_string(), value.clone());
            let resolved = layout.mapping.resolve_criteria(self.name(), &criteria)?;
            debug!(entity = self.name(), unique = column, "removing existing fixture");
            self.ctx.store.delete(&layout.base_table, &resolved)?;
        }

        let merged = self.merge_defaults(data)?;
        let resolved = layout.mapping.resolve_data_set(self.name(), &merged)?;
        self.ctx.store.insert(&layout.base_table, &resolved)?;
        let id = self.ctx.store.last_insert_id()?;

        info!(entity = self.name(), table = %layout.base_table, id = %id, "fixture created");
        Ok(id)
    }

    /// Fails unless a record matches `criteria`.
    pub fn assert_exists(&self, criteria: &DataSet) -> Result<()> {
        let layout = self.layout()?;
        let resolved = layout.mapping.resolve_criteria(self.name(), criteria)?;
        self.ctx.store.assert_exists(&layout.base_table, &resolved)?;
        Ok(())
    }

    /// Fails if any record matches `criteria`.
    pub fn assert_not_exists(&self, criteria: &DataSet) -> Result<()> {
        let layout = self.layout()?;
        let resolved = layout.mapping.resolve_criteria(self.name(), criteria)?;
        self.ctx
            .store
            .assert_not_exists(&layout.base_table, &resolved)?;
        Ok(())
    }

    /// Inserts the entity's seed data.
    ///
    /// Rows without a table go through the mapping into the base table; rows
    /// naming a table are written as-is. Every row is checked before the first
    /// insert.
    ///
    /// # Returns
    /// Inserted ids in declaration order; empty when no seed data is declared.
    pub fn insert_seed_data(&self) -> Result<Vec<Value>> {
        let Some(seed) = self.descriptor.seed_data() else {
            return Ok(Vec::new());
        };
        if seed.entries.is_empty() {
            return Err(self.invalid_seed("seed data declared but empty".to_string()));
        }

        let rows = seed
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| self.seed_row(index, entry))
            .collect::<Result<Vec<_>>>()?;

        let mut ids = Vec::with_capacity(rows.len());
        for (table, data) in rows {
            self.ctx.store.insert(&table, &data)?;
            ids.push(self.ctx.store.last_insert_id()?);
        }

        info!(entity = self.name(), rows = ids.len(), "seed data inserted");
        Ok(ids)
    }

    fn seed_row(&self, index: usize, entry: &SeedEntry) -> Result<(String, DataSet)> {
        let Value::Object(data) = &entry.data else {
            return Err(self.invalid_seed(format!("entry {index} is not an object")));
        };

        match &entry.table {
            Some(table) => Ok((table.clone(), data.clone())),
            None => {
                let layout = self.layout()?;
                let resolved = layout.mapping.resolve_data_set(self.name(), data)?;
                Ok((layout.base_table, resolved))
            }
        }
    }

    fn merge_defaults(&self, data: &DataSet) -> Result<DataSet> {
        let Some(provider) = self.descriptor.defaults() else {
            return Ok(data.clone());
        };

        let mut merged = DefaultsProvider::defaults(provider.as_ref(), self.ctx, data)?;
        for (key, value) in data {
            merged.insert(key.clone(), value.clone());
        }
        Ok(merged)
    }

    fn invalid_seed(&self, reason: String) -> DataModError {
        DataModError::SeedDataInvalid {
            entity: self.name().to_string(),
            reason,
        }
    }
}
