//! Integration test suite for the memory store.
//!
//! 1. Store operations through the `Store` trait
//! 2. Full data mod workflows over a real store

pub mod end_to_end_tests;
