//! Value access, references and sessions for a resolved entity.

use serde_json::Value;
use tracing::{debug, warn};

use super::DataMod;
use crate::data::DataSet;
use crate::error::{DataModError, Result};
use crate::session::SavedSession;
use crate::store::{self, StoreError};

impl DataMod<'_> {
    /// Looks up a logical field of the last selected record.
    ///
    /// # Returns
    /// `Ok(None)` when the store has no value for the field. Unmapped keys, a
    /// missing base table and other store failures are still errors.
    pub fn get_value(&self, key: &str) -> Result<Option<Value>> {
        match self.lookup(key) {
            Ok(value) => Ok(Some(value)),
            Err(StoreLookup::Store(StoreError::NotFound { qualified_name })) => {
                debug!(entity = self.name(), key, %qualified_name, "value not found");
                Ok(None)
            }
            Err(StoreLookup::Store(err)) => Err(err.into()),
            Err(StoreLookup::DataMod(err)) => Err(err),
        }
    }

    /// Like [`DataMod::get_value`] but falls back to `default`.
    pub fn get_value_or(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.get_value(key)?.unwrap_or(default))
    }

    /// Looks up a logical field that must have a value.
    ///
    /// # Errors
    /// `RequiredValueNotFound` carrying `message` and the store's not found
    /// error when nothing is stored.
    pub fn get_required_value(&self, key: &str, message: Option<&str>) -> Result<Value> {
        match self.lookup(key) {
            Ok(value) => Ok(value),
            Err(StoreLookup::Store(source @ StoreError::NotFound { .. })) => {
                Err(DataModError::RequiredValueNotFound {
                    entity: self.name().to_string(),
                    key: key.to_string(),
                    message: message.map(str::to_string),
                    source,
                })
            }
            Err(StoreLookup::Store(err)) => Err(err.into()),
            Err(StoreLookup::DataMod(err)) => Err(err),
        }
    }

    /// Selects by `criteria` and returns every declared field of the first
    /// match, in declaration order. Absent values come back as `Null`.
    pub fn get_single(&self, criteria: &DataSet) -> Result<DataSet> {
        self.select(criteria)?;

        let layout = self.layout()?;
        let mut row = DataSet::new();
        for logical in layout.mapping.logical_names() {
            let value = self.get_value(logical)?.unwrap_or(Value::Null);
            row.insert(logical.to_string(), value);
        }
        Ok(row)
    }

    /// Selects by `criteria` and returns one field of the first match.
    pub fn get_column(&self, key: &str, criteria: &DataSet) -> Result<Option<Value>> {
        self.select(criteria)?;
        self.get_value(key)
    }

    /// Keyword placeholder for a logical field, `{<table>.<column>}`.
    pub fn keyword(&self, key: &str) -> Result<String> {
        let layout = self.layout()?;
        let column = layout.mapping.resolve_column(self.name(), key)?;
        Ok(store::keyword(&layout.base_table, &column))
    }

    /// External reference to `key` of the first record matching `criteria`.
    pub fn sub_select(&self, key: &str, criteria: &DataSet) -> Result<String> {
        let layout = self.layout()?;
        let column = layout.mapping.resolve_physical(self.name(), key)?;
        let resolved = layout.mapping.resolve_criteria(self.name(), criteria)?;
        Ok(self
            .ctx
            .store
            .build_sub_select_reference(&layout.base_table, &column, &resolved)?)
    }

    /// Remembers the current value of `key` for this entity type.
    ///
    /// A missing value is saved as `Null`. Saving again replaces the earlier
    /// session.
    pub fn save_session(&self, key: &str) -> Result<()> {
        // restore selects by this key, so it must be a real column
        self.layout()?.mapping.resolve_physical(self.name(), key)?;
        let value = self.get_value(key)?.unwrap_or(Value::Null);
        let session = SavedSession {
            key: key.to_string(),
            value,
        };
        if let Some(previous) = self.ctx.sessions.save(self.name(), session) {
            debug!(entity = self.name(), replaced = %previous.key, "session replaced");
        }
        Ok(())
    }

    /// Re-selects the record captured by [`DataMod::save_session`].
    ///
    /// # Errors
    /// `NoSavedSession` when nothing was saved for this entity type.
    pub fn restore_session(&self) -> Result<()> {
        let Some(session) = self.ctx.sessions.get(self.name()) else {
            warn!(entity = self.name(), "restore without saved session");
            return Err(DataModError::NoSavedSession {
                entity: self.name().to_string(),
            });
        };

        let layout = self.layout()?;
        let column = layout.mapping.resolve_physical(self.name(), &session.key)?;
        let mut criteria = DataSet::new();
        criteria.insert(column, session.value);

        debug!(entity = self.name(), key = %session.key, "restoring session");
        self.ctx.store.select(&layout.base_table, &criteria)?;
        Ok(())
    }

    fn lookup(&self, key: &str) -> std::result::Result<Value, StoreLookup> {
        let layout = self.layout().map_err(StoreLookup::DataMod)?;
        let column = layout
            .mapping
            .resolve_column(self.name(), key)
            .map_err(StoreLookup::DataMod)?;
        self.ctx
            .store
            .value_by_qualified_name(&store::qualified_name(&layout.base_table, &column))
            .map_err(StoreLookup::Store)
    }
}

/// Keeps store failures apart from resolution failures so callers can pick
/// out "not found".
enum StoreLookup {
    DataMod(DataModError),
    Store(StoreError),
}
