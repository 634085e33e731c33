//! Database container managing tables.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::config::MemStoreConfig;
use crate::error::MemDbError;
use crate::table::Table;

/// Database container holding all tables.
#[derive(Debug)]
pub struct Database {
    /// Map of table name to table instance
    tables: RwLock<HashMap<String, Table>>,
    config: MemStoreConfig,
}

impl Database {
    /// Creates a new empty database with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemStoreConfig::default())
    }

    /// Creates a new empty database.
    pub fn with_config(config: MemStoreConfig) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &MemStoreConfig {
        &self.config
    }

    /// Creates a new table.
    ///
    /// # Arguments
    /// * `name` - Table name
    /// * `columns` - Optional fixed column list
    ///
    /// # Returns
    /// `Result<(), MemDbError>`; `TableAlreadyExists` if the name is taken.
    pub fn create_table(&self, name: &str, columns: Option<Vec<String>>) -> Result<(), MemDbError> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(MemDbError::TableAlreadyExists(name.to_string()));
        }
        let table = self.new_table(name, columns)?;
        tables.insert(name.to_string(), table);
        debug!(table = name, "table created");
        Ok(())
    }

    /// Deletes a table by name.
    pub fn delete_table(&self, name: &str) -> Result<(), MemDbError> {
        self.tables
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MemDbError::TableNotFound {
                table: name.to_string(),
            })
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Runs `f` against a table under the read lock.
    ///
    /// # Returns
    /// `Result<R, MemDbError>`; `TableNotFound` if the table does not exist.
    pub fn with_table<F, R>(&self, name: &str, f: F) -> Result<R, MemDbError>
    where
        F: FnOnce(&Table) -> R,
    {
        let tables = self.tables.read();
        let table = tables.get(name).ok_or_else(|| MemDbError::TableNotFound {
            table: name.to_string(),
        })?;
        Ok(f(table))
    }

    /// Runs `f` against a table under the write lock, creating the table first
    /// when `auto_create_tables` is set.
    pub fn with_table_mut<F, R>(&self, name: &str, f: F) -> Result<R, MemDbError>
    where
        F: FnOnce(&mut Table) -> R,
    {
        let mut tables = self.tables.write();
        if !tables.contains_key(name) && self.config.auto_create_tables {
            let table = self.new_table(name, None)?;
            tables.insert(name.to_string(), table);
            debug!(table = name, "table auto-created");
        }
        let table = tables
            .get_mut(name)
            .ok_or_else(|| MemDbError::TableNotFound {
                table: name.to_string(),
            })?;
        Ok(f(table))
    }

    /// All rows of every table as JSON, keyed by table name.
    pub fn snapshot(&self) -> Value {
        let tables = self.tables.read();
        let sorted: BTreeMap<&String, &Table> = tables.iter().collect();

        let mut snapshot = serde_json::Map::new();
        for (name, table) in sorted {
            let rows = table.rows().iter().cloned().map(Value::Object).collect();
            snapshot.insert(name.clone(), Value::Array(rows));
        }
        Value::Object(snapshot)
    }

    fn new_table(&self, name: &str, columns: Option<Vec<String>>) -> Result<Table, MemDbError> {
        Table::create(
            name.to_string(),
            self.config.id_column.clone(),
            columns,
            self.config.initial_table_capacity,
            self.config.max_rows_per_table,
        )
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
