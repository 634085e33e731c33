//! Saved sessions: one remembered (key, value) pair per entity type.
//!
//! Sessions are keyed by entity identity, not by row, so only one "current
//! row" per entity type can be remembered at a time.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;

/// Key and value captured by `save_session`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSession {
    /// Logical field name
    pub key: String,
    /// Value at save time; `Null` when the value was absent
    pub value: Value,
}

/// Per-entity session storage.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SavedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session for `entity`, overwriting any earlier one.
    pub fn save(&self, entity: &str, session: SavedSession) -> Option<SavedSession> {
        self.sessions.lock().insert(entity.to_string(), session)
    }

    /// Returns the saved session for `entity`.
    pub fn get(&self, entity: &str) -> Option<SavedSession> {
        self.sessions.lock().get(entity).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
