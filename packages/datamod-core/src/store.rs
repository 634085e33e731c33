//! Store collaborator interface.
//!
//! The store executes the physical operations: selects, writes, deletes and
//! the keyword lookups that surface values of the last selected row. Every
//! argument handed to a store has already been through field mapping
//! resolution, so column names are physical.

use serde_json::Value;
use thiserror::Error;

use crate::data::DataSet;

/// Store operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Qualified name has no value in the keyword store
    #[error("Keyword '{qualified_name}' not found")]
    NotFound { qualified_name: String },

    /// Table not found
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Existence assertion failed
    #[error("Expected {} in table '{table}' matching {criteria}", expectation(.expected))]
    AssertionFailed {
        table: String,
        criteria: String,
        expected: bool,
    },

    /// External reference could not be resolved
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

fn expectation(expected: &bool) -> &'static str {
    if *expected {
        "a record"
    } else {
        "no record"
    }
}

/// Physical storage operations consumed by the data mod layer.
///
/// Implementations are expected to be synchronous. Methods take `&self`, so
/// backends keep their mutable state behind their own locks.
pub trait Store: Send + Sync {
    /// Selects records and publishes the first match to the keyword store.
    fn select(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError>;

    /// Inserts a record.
    fn insert(&self, table: &str, data: &DataSet) -> Result<(), StoreError>;

    /// Returns the identity generated by the most recent insert.
    fn last_insert_id(&self) -> Result<Value, StoreError>;

    /// Updates every record matching `criteria` with `values`.
    fn update(&self, table: &str, values: &DataSet, criteria: &DataSet)
        -> Result<(), StoreError>;

    /// Deletes every record matching `criteria`.
    fn delete(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError>;

    /// Resolves `"<table>.<column>"` against the keyword store.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` when nothing is stored under the name.
    fn value_by_qualified_name(&self, qualified_name: &str) -> Result<Value, StoreError>;

    /// Passes when at least one record matches `criteria`.
    fn assert_exists(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError>;

    /// Passes when no record matches `criteria`.
    fn assert_not_exists(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError>;

    /// Builds an external reference that resolves to `column` of the first
    /// record in `table` matching `criteria`.
    fn build_sub_select_reference(
        &self,
        table: &str,
        column: &str,
        criteria: &DataSet,
    ) -> Result<String, StoreError> {
        Ok(sub_select_reference(table, column, criteria))
    }
}

/// Joins a table and column into the name used by the keyword store.
pub fn qualified_name(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

/// Wraps a qualified name in the keyword placeholder syntax.
pub fn keyword(table: &str, column: &str) -> String {
    format!("{{{}}}", qualified_name(table, column))
}

/// Characters with a meaning inside the criteria part of a reference.
const REFERENCE_SPECIALS: [char; 5] = ['\\', ',', ':', '|', ']'];

/// Formats `[table.column|col:val,col:val]`.
///
/// Separators occurring in criteria keys or values are escaped with `\`.
pub fn sub_select_reference(table: &str, column: &str, criteria: &DataSet) -> String {
    let clauses = criteria
        .iter()
        .map(|(key, value)| {
            format!(
                "{}:{}",
                escape_reference_text(key),
                escape_reference_text(&value_text(value))
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    format!("[{table}.{column}|{clauses}]")
}

fn escape_reference_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if REFERENCE_SPECIALS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Splits `text` at every unescaped `separator`, keeping escapes in place.
fn split_unescaped(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == separator => {
                parts.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Removes escapes; `None` on a dangling `\` or an unescaped special.
fn unescape_reference_text(text: &str) -> Option<String> {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => unescaped.push(chars.next()?),
            c if REFERENCE_SPECIALS.contains(&c) => return None,
            c => unescaped.push(c),
        }
    }
    Some(unescaped)
}

/// Renders a value the way it appears inside references and criteria text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Parsed form of a sub-select reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SubSelectReference {
    pub table: String,
    pub column: String,
    pub criteria: DataSet,
}

impl SubSelectReference {
    /// Parses `[table.column|col:val,...]`, undoing the escapes written by
    /// [`sub_select_reference`]. Returns `None` when `text` is not in
    /// reference form at all, and an error when it looks like a reference but
    /// is malformed.
    pub fn parse(text: &str) -> Option<Result<Self, StoreError>> {
        let inner = text.strip_prefix('[')?.strip_suffix(']')?;
        let (target, clauses) = inner.split_once('|')?;

        let invalid = |reason: &str| StoreError::InvalidReference {
            reference: text.to_string(),
            reason: reason.to_string(),
        };

        let Some((table, column)) = target.rsplit_once('.') else {
            return Some(Err(invalid("target must be <table>.<column>")));
        };
        if table.is_empty() || column.is_empty() {
            return Some(Err(invalid("empty table or column")));
        }

        let mut criteria = DataSet::new();
        for clause in split_unescaped(clauses, ',') {
            if clause.is_empty() {
                continue;
            }
            let (key, value) = match split_unescaped(clause, ':').as_slice() {
                [key, value] => (
                    unescape_reference_text(key.trim()),
                    unescape_reference_text(value),
                ),
                _ => return Some(Err(invalid("criteria must be <column>:<value>"))),
            };
            let (Some(key), Some(value)) = (key, value) else {
                return Some(Err(invalid("unescaped separator in criteria")));
            };
            criteria.insert(key, Value::String(value));
        }

        Some(Ok(Self {
            table: table.to_string(),
            column: column.to_string(),
            criteria,
        }))
    }
}
