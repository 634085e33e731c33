//! [`Store`] implementation over the in-memory database.

use datamod_core::store::SubSelectReference;
use datamod_core::{DataSet, Store, StoreError};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::MemStoreConfig;
use crate::database::Database;
use crate::error::MemDbError;
use crate::keystore::KeywordStore;
use crate::table::Row;

/// In-memory store with a keyword store for the last selected rows.
#[derive(Debug, Default)]
pub struct MemoryStore {
    db: Database,
    keywords: Mutex<KeywordStore>,
    last_insert_id: Mutex<Option<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemStoreConfig) -> Self {
        Self {
            db: Database::with_config(config),
            ..Default::default()
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates a table, optionally with a fixed column list.
    pub fn create_table(&self, name: &str, columns: Option<Vec<String>>) -> Result<(), MemDbError> {
        self.db.create_table(name, columns)
    }

    /// All tables as JSON.
    pub fn snapshot(&self) -> Value {
        self.db.snapshot()
    }

    /// Every keyword currently published, sorted by qualified name.
    pub fn keywords(&self) -> Vec<(String, Value)> {
        self.keywords.lock().entries()
    }

    /// Rows matching `criteria`; a missing table counts as empty when tables
    /// are created on demand.
    fn matching_rows(
        &self,
        table: &str,
        criteria: &DataSet,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, MemDbError> {
        let result = self.db.with_table(table, |t| {
            let indices = t.query_records(criteria, limit, None)?;
            Ok::<Vec<Row>, MemDbError>(
                indices
                    .into_iter()
                    .filter_map(|index| t.row(index).cloned())
                    .collect(),
            )
        });
        match result {
            Ok(rows) => rows,
            Err(MemDbError::TableNotFound { .. }) if self.db.config().auto_create_tables => {
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Replaces sub-select references with the value they point at.
    ///
    /// Strings that only look like a reference but do not parse are kept as
    /// literals.
    fn resolve_references(&self, data: &DataSet) -> Result<DataSet, MemDbError> {
        let mut resolved = DataSet::with_capacity(data.len());
        for (column, value) in data {
            let value = match value {
                Value::String(text) => match SubSelectReference::parse(text) {
                    Some(Ok(reference)) => self.resolve_reference(text, &reference)?,
                    Some(Err(err)) => {
                        trace!(column = %column, error = %err, "keeping reference-like literal");
                        value.clone()
                    }
                    None => value.clone(),
                },
                other => other.clone(),
            };
            resolved.insert(column.clone(), value);
        }
        Ok(resolved)
    }

    fn resolve_reference(
        &self,
        text: &str,
        reference: &SubSelectReference,
    ) -> Result<Value, MemDbError> {
        let invalid = |reason: String| MemDbError::InvalidReference {
            reference: text.to_string(),
            reason,
        };

        let rows = self.matching_rows(&reference.table, &reference.criteria, Some(1))?;
        let row = rows
            .first()
            .ok_or_else(|| invalid("no matching row".to_string()))?;
        let value = row
            .get(&reference.column)
            .cloned()
            .ok_or_else(|| invalid(format!("column '{}' not set", reference.column)))?;

        trace!(reference = text, value = %value, "resolved sub-select");
        Ok(value)
    }

    fn criteria_text(criteria: &DataSet) -> String {
        Value::Object(criteria.clone()).to_string()
    }
}

impl Store for MemoryStore {
    fn select(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError> {
        let criteria = self.resolve_references(criteria)?;
        let rows = self.matching_rows(table, &criteria, Some(1))?;

        let mut keywords = self.keywords.lock();
        match rows.first() {
            Some(row) => keywords.publish(table, row),
            None => keywords.clear(table),
        }
        debug!(table, matched = !rows.is_empty(), "select");
        Ok(())
    }

    fn insert(&self, table: &str, data: &DataSet) -> Result<(), StoreError> {
        let data = self.resolve_references(data)?;
        let (id, row) = self.db.with_table_mut(table, |t| {
            let id = t.insert_row(&data)?;
            let row = t.rows().last().cloned().unwrap_or_default();
            Ok::<_, MemDbError>((id, row))
        })??;

        self.keywords.lock().publish(table, &row);
        debug!(table, id = %id, "insert");
        *self.last_insert_id.lock() = Some(id);
        Ok(())
    }

    fn last_insert_id(&self) -> Result<Value, StoreError> {
        self.last_insert_id
            .lock()
            .clone()
            .ok_or_else(|| MemDbError::NoInsert.into())
    }

    fn update(&self, table: &str, values: &DataSet, criteria: &DataSet) -> Result<(), StoreError> {
        let values = self.resolve_references(values)?;
        let criteria = self.resolve_references(criteria)?;
        let updated = self.db.with_table_mut(table, |t| {
            let indices = t.query_records(&criteria, None, None)?;
            t.update_rows(&indices, &values)
        })??;
        debug!(table, updated, "update");
        Ok(())
    }

    fn delete(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError> {
        let criteria = self.resolve_references(criteria)?;
        let deleted = self.db.with_table_mut(table, |t| {
            let indices = t.query_records(&criteria, None, None)?;
            Ok::<_, MemDbError>(t.delete_rows(&indices))
        })??;
        debug!(table, deleted, "delete");
        Ok(())
    }

    fn value_by_qualified_name(&self, qualified: &str) -> Result<Value, StoreError> {
        self.keywords
            .lock()
            .get(qualified)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                qualified_name: qualified.to_string(),
            })
    }

    fn assert_exists(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError> {
        let criteria = self.resolve_references(criteria)?;
        if self.matching_rows(table, &criteria, Some(1))?.is_empty() {
            return Err(StoreError::AssertionFailed {
                table: table.to_string(),
                criteria: Self::criteria_text(&criteria),
                expected: true,
            });
        }
        Ok(())
    }

    fn assert_not_exists(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError> {
        let criteria = self.resolve_references(criteria)?;
        if !self.matching_rows(table, &criteria, Some(1))?.is_empty() {
            return Err(StoreError::AssertionFailed {
                table: table.to_string(),
                criteria: Self::criteria_text(&criteria),
                expected: false,
            });
        }
        Ok(())
    }
}
