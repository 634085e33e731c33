//! Field-mapping and fixture lifecycle engine for behaviour-driven database tests.
//!
//! Translates the semantic column names used in test scenarios into physical
//! columns, creates and resets fixture rows, tracks a saved "current row" per
//! entity and resolves scenario references to entity descriptors, optionally
//! through a bridge.

pub mod bridge;
pub mod config;
pub mod context;
pub mod data;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod registry;
pub mod session;
pub mod store;

pub use bridge::{Bridge, StaticBridge};
pub use context::{DataMod, DataModContext};
pub use data::DataSet;
pub use entity::{DefaultsProvider, EntityDescriptor, SeedData, SeedEntry};
pub use error::{DataModError, Result};
pub use mapping::{ColumnMapping, FieldMapping};
pub use registry::EntityRegistry;
pub use store::{Store, StoreError};
