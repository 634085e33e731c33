//! Memory store configuration.

use serde::{Deserialize, Serialize};

/// Memory store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemStoreConfig {
    /// Initial row capacity per table
    pub initial_table_capacity: usize,
    /// Auto-increment identity column
    pub id_column: String,
    /// Create unknown tables on first write and treat them as empty on read
    pub auto_create_tables: bool,
    /// Maximum rows per table (default: unlimited)
    pub max_rows_per_table: usize,
}

impl Default for MemStoreConfig {
    fn default() -> Self {
        Self {
            initial_table_capacity: 64,
            id_column: "id".to_string(),
            auto_create_tables: true,
            max_rows_per_table: usize::MAX,
        }
    }
}
