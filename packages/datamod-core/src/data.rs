//! Row data sets and convenience accessors for step input.

use serde_json::Value;

use crate::error::{DataModError, Result};

/// One row's worth of data keyed by field name, in insertion order.
pub type DataSet = serde_json::Map<String, Value>;

/// Builds a data set from key/value pairs.
pub fn data_set<K, V, I>(pairs: I) -> DataSet
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Gets a required index out of a data set.
///
/// # Errors
/// `DataModError::MissingRequiredData` if `key` is absent.
pub fn required_data<'a>(data: &'a DataSet, key: &str) -> Result<&'a Value> {
    data.get(key).ok_or_else(|| missing(key, &[key], data))
}

/// Gets an optional index out of a data set, falling back to `default`.
pub fn optional_data(data: &DataSet, key: &str, default: Value) -> Value {
    data.get(key).cloned().unwrap_or(default)
}

/// Checks that every key in `required` is present in `data`.
pub fn require_fields(data: &DataSet, required: &[&str]) -> Result<()> {
    match required.iter().find(|key| !data.contains_key(**key)) {
        Some(key) => Err(missing(key, required, data)),
        None => Ok(()),
    }
}

fn missing(key: &str, declared: &[&str], data: &DataSet) -> DataModError {
    DataModError::MissingRequiredData {
        key: key.to_string(),
        declared: declared.iter().map(|k| k.to_string()).collect(),
        data: Value::Object(data.clone()).to_string(),
    }
}
