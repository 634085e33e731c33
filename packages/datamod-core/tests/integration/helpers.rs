//! Shared fixtures: a recording store and the entities used across suites.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use datamod_core::store::{qualified_name, Store, StoreError};
use datamod_core::{DataModContext, DataSet, EntityDescriptor, FieldMapping};

/// One call observed by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Select(String, DataSet),
    Insert(String, DataSet),
    Update(String, DataSet, DataSet),
    Delete(String, DataSet),
    AssertExists(String, DataSet),
    AssertNotExists(String, DataSet),
}

/// Store double that records every call and answers keyword lookups from a
/// preset map.
#[derive(Debug, Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<Call>>,
    keywords: Mutex<HashMap<String, Value>>,
    last_id: Mutex<Value>,
    fail_inserts: Mutex<bool>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            last_id: Mutex::new(json!(5)),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn set_keyword(&self, table: &str, column: &str, value: Value) {
        self.keywords
            .lock()
            .insert(qualified_name(table, column), value);
    }

    pub fn set_last_id(&self, id: Value) {
        *self.last_id.lock() = id;
    }

    pub fn fail_inserts(&self) {
        *self.fail_inserts.lock() = true;
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl Store for RecordingStore {
    fn select(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError> {
        self.record(Call::Select(table.to_string(), criteria.clone()));
        Ok(())
    }

    fn insert(&self, table: &str, data: &DataSet) -> Result<(), StoreError> {
        if *self.fail_inserts.lock() {
            return Err(StoreError::Backend("insert rejected".to_string()));
        }
        self.record(Call::Insert(table.to_string(), data.clone()));
        Ok(())
    }

    fn last_insert_id(&self) -> Result<Value, StoreError> {
        Ok(self.last_id.lock().clone())
    }

    fn update(&self, table: &str, values: &DataSet, criteria: &DataSet) -> Result<(), StoreError> {
        self.record(Call::Update(
            table.to_string(),
            values.clone(),
            criteria.clone(),
        ));
        Ok(())
    }

    fn delete(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError> {
        self.record(Call::Delete(table.to_string(), criteria.clone()));
        Ok(())
    }

    fn value_by_qualified_name(&self, qualified_name: &str) -> Result<Value, StoreError> {
        self.keywords
            .lock()
            .get(qualified_name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                qualified_name: qualified_name.to_string(),
            })
    }

    fn assert_exists(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError> {
        self.record(Call::AssertExists(table.to_string(), criteria.clone()));
        Ok(())
    }

    fn assert_not_exists(&self, table: &str, criteria: &DataSet) -> Result<(), StoreError> {
        self.record(Call::AssertNotExists(table.to_string(), criteria.clone()));
        Ok(())
    }
}

/// Builds a data set from a JSON object literal.
pub fn data(value: Value) -> DataSet {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

pub fn user_mapping() -> FieldMapping {
    FieldMapping::new()
        .with("id", "id")
        .with("name", "forename")
        .with("dob", "dob")
}

pub fn user() -> EntityDescriptor {
    EntityDescriptor::new("DataMod::User", "User", user_mapping())
}

/// Context over a fresh recording store with `User` registered.
pub fn context() -> (Arc<RecordingStore>, DataModContext) {
    let store = RecordingStore::new();
    let ctx = DataModContext::new(store.clone());
    ctx.register_entity(user());
    (store, ctx)
}
