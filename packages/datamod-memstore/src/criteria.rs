//! Row filters built from physical criteria.
//!
//! A criterion value is one of:
//! - `"NULL"` or JSON null: the column is missing or null
//! - `"!NULL"`: the column is present and not null
//! - anything else: equality, comparing scalars by their text form so that
//!   `"5"` matches `5`

use datamod_core::store::value_text;
use datamod_core::DataSet;
use serde_json::Value;

/// Text marking an "is null" criterion.
pub const IS_NULL: &str = "NULL";

/// Text marking an "is not null" criterion.
pub const NOT_NULL: &str = "!NULL";

/// Test applied to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    IsNull,
    NotNull,
    Equals(Value),
}

impl Criterion {
    pub fn parse(value: &Value) -> Self {
        match value {
            Value::Null => Self::IsNull,
            Value::String(text) if text == IS_NULL => Self::IsNull,
            Value::String(text) if text == NOT_NULL => Self::NotNull,
            other => Self::Equals(other.clone()),
        }
    }

    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match (self, actual) {
            (Self::IsNull, None | Some(Value::Null)) => true,
            (Self::IsNull, Some(_)) => false,
            (Self::NotNull, Some(value)) => !value.is_null(),
            (Self::NotNull, None) => false,
            (Self::Equals(expected), Some(value)) => values_equal(expected, value),
            (Self::Equals(_), None) => false,
        }
    }
}

/// Compiled criteria: every filter must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    tests: Vec<(String, Criterion)>,
}

impl Filter {
    pub fn compile(criteria: &DataSet) -> Self {
        Self {
            tests: criteria
                .iter()
                .map(|(column, value)| (column.clone(), Criterion::parse(value)))
                .collect(),
        }
    }

    /// Columns the filter reads.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.tests.iter().map(|(column, _)| column.as_str())
    }

    pub fn matches(&self, row: &DataSet) -> bool {
        self.tests
            .iter()
            .all(|(column, criterion)| criterion.matches(row.get(column)))
    }
}

/// Loose scalar equality used by criteria.
pub fn values_equal(expected: &Value, actual: &Value) -> bool {
    if expected == actual {
        return true;
    }
    match (expected, actual) {
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => value_text(expected) == value_text(actual),
    }
}
