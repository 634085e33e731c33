//! In-memory store backend for the data mod layer.
//!
//! Keeps tables as ordered rows with an auto-increment identity, resolves
//! sub-select references and `NULL`/`!NULL` criteria, and publishes the last
//! selected or inserted row of each table to a keyword store.

pub mod config;
pub mod criteria;
pub mod database;
pub mod error;
pub mod keystore;
pub mod store;
pub mod table;

pub use config::MemStoreConfig;
pub use error::MemDbError;
pub use store::MemoryStore;
