//! Shared helpers for integration tests.

pub mod fixtures;
pub mod relation_assertions;
