//! Query-related methods for table operations.

use datamod_core::DataSet;

use super::{Row, Table};
use crate::criteria::Filter;
use crate::error::MemDbError;

impl Table {
    /// Queries rows matching every criterion.
    ///
    /// # Arguments
    /// * `criteria` - Physical column to criterion value
    /// * `limit` - Maximum number of rows to return
    /// * `offset` - Number of matching rows to skip
    ///
    /// # Returns
    /// `Result<Vec<usize>, MemDbError>` containing indices of matching rows in
    /// insertion order.
    pub fn query_records(
        &self,
        criteria: &DataSet,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<usize>, MemDbError> {
        let filter = Filter::compile(criteria);
        self.check_columns(filter.columns())?;

        let skip_count = offset.unwrap_or(0);
        let mut matched_total = 0;
        let mut matching_indices = Vec::new();

        for (index, row) in self.rows.iter().enumerate() {
            if !filter.matches(row) {
                continue;
            }
            matched_total += 1;
            if matched_total <= skip_count {
                continue;
            }

            matching_indices.push(index);
            if let Some(limit_val) = limit {
                if matching_indices.len() >= limit_val {
                    break;
                }
            }
        }

        Ok(matching_indices)
    }

    /// First row matching `criteria`.
    pub fn first_match(&self, criteria: &DataSet) -> Result<Option<&Row>, MemDbError> {
        let indices = self.query_records(criteria, Some(1), None)?;
        Ok(indices.first().and_then(|&index| self.row(index)))
    }

    /// Number of rows matching `criteria`.
    pub fn count_matching(&self, criteria: &DataSet) -> Result<usize, MemDbError> {
        Ok(self.query_records(criteria, None, None)?.len())
    }
}
