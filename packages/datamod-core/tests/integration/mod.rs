//! Integration test suite for the data mod layer.
//!
//! Everything runs against a recording store so the exact physical calls can
//! be asserted:
//! 1. Fixture lifecycle
//! 2. Value access and sessions
//! 3. Reference resolution and bridges
//! 4. Seed data
//! 5. Configuration

pub mod config_tests;
pub mod helpers;
pub mod registry_tests;
