//! Tracing/logging setup shared by binaries and tests.

/// Tracing subscriber configuration (filters, formats).
pub mod tracing;

pub use crate::tracing::{init, init_for_tests, init_with_default_filter};
