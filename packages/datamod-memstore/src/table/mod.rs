//! Table rows, identity sequence and queries.

mod query;
#[allow(clippy::module_inception)]
mod table;

pub use table::{Row, Table};
