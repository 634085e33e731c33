//! Keyword store: values of the last selected or inserted row per table.

use std::collections::HashMap;

use datamod_core::store::qualified_name;
use datamod_core::DataSet;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct KeywordStore {
    tables: HashMap<String, DataSet>,
}

impl KeywordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the table's entries with `row`.
    pub fn publish(&mut self, table: &str, row: &DataSet) {
        self.tables.insert(table.to_string(), row.clone());
    }

    /// Forgets every entry of `table`.
    pub fn clear(&mut self, table: &str) {
        self.tables.remove(table);
    }

    /// Looks up `"<table>.<column>"`. The table part may itself contain dots.
    pub fn get(&self, qualified: &str) -> Option<&Value> {
        let (table, column) = qualified.rsplit_once('.')?;
        self.tables.get(table)?.get(column)
    }

    /// Every published entry as `(qualified name, value)`, sorted.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<_> = self
            .tables
            .iter()
            .flat_map(|(table, row)| {
                row.iter()
                    .map(move |(column, value)| (qualified_name(table, column), value.clone()))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
