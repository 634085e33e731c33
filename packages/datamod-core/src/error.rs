//! Error types for mapping, fixture and registry operations.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for data mod operations.
pub type Result<T> = std::result::Result<T, DataModError>;

/// Data mod operation errors.
#[derive(Error, Debug, Clone)]
pub enum DataModError {
    /// Logical key absent from the entity's field mapping
    #[error("No data mapping provided for key '{key}' on entity '{entity}', available mapping: {available}")]
    UnmappedField {
        entity: String,
        key: String,
        available: String,
    },

    /// Passthrough field used where a physical column is required
    #[error("Field '{key}' on entity '{entity}' is not persisted and cannot be used as a criterion")]
    UnpersistedField { entity: String, key: String },

    /// Base table resolved empty
    #[error("Entity '{entity}' requires a base table to operate on")]
    MissingBaseTable { entity: String },

    /// Unique column named but no value supplied for it
    #[error("Unique column '{column}' has no value in the fixture data for entity '{entity}'")]
    MissingUniqueColumnValue { entity: String, column: String },

    /// Required value lookup found nothing
    #[error("Required value '{key}' not found for entity '{entity}'{}", message_suffix(.message))]
    RequiredValueNotFound {
        entity: String,
        key: String,
        message: Option<String>,
        #[source]
        source: StoreError,
    },

    /// restore_session called before save_session
    #[error("No saved session for entity '{entity}'")]
    NoSavedSession { entity: String },

    /// Reference did not resolve to a registered entity
    #[error("Unable to find data mod '{reference}' (tried '{identifier}'), please make sure it is registered correctly and exists. Registered data mod mapping: {registry}")]
    EntityNotFound {
        reference: String,
        identifier: String,
        registry: String,
    },

    /// Bridge does not satisfy the bridge contract
    #[error("Invalid bridge '{bridge}': {reason}")]
    InvalidBridge { bridge: String, reason: String },

    /// Seed data declared but unusable
    #[error("Invalid seed data for entity '{entity}': {reason}")]
    SeedDataInvalid { entity: String, reason: String },

    /// Required data index missing from a data set
    #[error("Expected to have data index '{key}' in data {data}, declared required data: {declared:?}")]
    MissingRequiredData {
        key: String,
        declared: Vec<String>,
        data: String,
    },

    /// Store failure propagated unchanged
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default()
}
