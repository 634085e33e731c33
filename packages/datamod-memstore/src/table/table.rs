//! Table rows and identity management.
//!
//! Each table has:
//! - Rows as ordered data sets, in insertion order
//! - An auto-increment identity column
//! - An optional fixed column list enforced on write

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use datamod_core::DataSet;
use serde_json::Value;

use crate::error::MemDbError;

/// One stored row.
pub type Row = DataSet;

/// Rows and schema of one table.
#[derive(Debug)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Auto-increment identity column
    pub id_column: String,
    /// Declared columns; `None` accepts any column
    pub columns: Option<Vec<String>>,
    /// Maximum number of rows
    pub max_rows: usize,
    pub(crate) rows: Vec<Row>,
    /// Next identity to assign (atomic counter)
    next_id: AtomicU64,
}

impl Table {
    /// Creates an empty table.
    ///
    /// # Arguments
    /// * `name` - Table name
    /// * `id_column` - Identity column filled on insert when absent
    /// * `columns` - Optional fixed column list; the identity column is always
    ///   accepted
    /// * `initial_capacity` - Initial row capacity
    /// * `max_rows` - Maximum number of rows
    ///
    /// # Returns
    /// `Result<Table, MemDbError>`; `DuplicateColumn` if a column repeats.
    pub fn create(
        name: String,
        id_column: String,
        columns: Option<Vec<String>>,
        initial_capacity: usize,
        max_rows: usize,
    ) -> Result<Self, MemDbError> {
        if let Some(columns) = &columns {
            let mut seen = std::collections::HashSet::new();
            for column in columns {
                if !seen.insert(column) {
                    return Err(MemDbError::DuplicateColumn {
                        table: name,
                        column: column.clone(),
                    });
                }
            }
        }

        Ok(Self {
            name,
            id_column,
            columns,
            max_rows,
            rows: Vec::with_capacity(initial_capacity),
            next_id: AtomicU64::new(1), // Start IDs at 1
        })
    }

    /// Atomically increments and returns the next identity.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the next identity without incrementing.
    pub fn current_next_id(&self) -> u64 {
        self.next_id.load(Ordering::Acquire)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Checks that every column is declared, when the table declares columns.
    pub fn check_columns<'a>(
        &self,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), MemDbError> {
        let Some(declared) = &self.columns else {
            return Ok(());
        };
        for column in columns {
            if column != self.id_column && !declared.iter().any(|c| c == column) {
                return Err(MemDbError::ColumnNotFound {
                    table: self.name.clone(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Appends a row, filling the identity column when it is absent or null.
    ///
    /// An explicit numeric identity moves the sequence past it.
    ///
    /// # Returns
    /// `Result<Value, MemDbError>` containing the row's identity.
    pub fn insert_row(&mut self, data: &DataSet) -> Result<Value, MemDbError> {
        self.check_columns(data.keys().map(String::as_str))?;
        if self.rows.len() >= self.max_rows {
            return Err(MemDbError::RowLimitExceeded {
                table: self.name.clone(),
                limit: self.max_rows,
            });
        }

        let id = match data.get(&self.id_column) {
            Some(value) if !value.is_null() => {
                if let Some(explicit) = value.as_u64() {
                    self.next_id
                        .fetch_max(explicit.saturating_add(1), Ordering::SeqCst);
                }
                value.clone()
            }
            _ => Value::from(self.next_id()),
        };

        let mut row = Row::with_capacity(data.len() + 1);
        row.insert(self.id_column.clone(), id.clone());
        for (column, value) in data {
            if *column != self.id_column {
                row.insert(column.clone(), value.clone());
            }
        }
        self.rows.push(row);
        Ok(id)
    }

    /// Applies `values` to the rows at `indices`.
    ///
    /// # Returns
    /// Number of rows updated.
    pub fn update_rows(&mut self, indices: &[usize], values: &DataSet) -> Result<usize, MemDbError> {
        self.check_columns(values.keys().map(String::as_str))?;
        let mut updated = 0;
        for &index in indices {
            if let Some(row) = self.rows.get_mut(index) {
                for (column, value) in values {
                    row.insert(column.clone(), value.clone());
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Removes the rows at `indices`.
    ///
    /// # Returns
    /// Number of rows removed.
    pub fn delete_rows(&mut self, indices: &[usize]) -> usize {
        let before = self.rows.len();
        let doomed: HashSet<usize> = indices.iter().copied().collect();
        let mut index = 0;
        self.rows.retain(|_| {
            let keep = !doomed.contains(&index);
            index += 1;
            keep
        });
        before - self.rows.len()
    }

    /// Removes every row without resetting the identity sequence.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
