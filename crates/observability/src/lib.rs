//! Tracing and logging setup shared by every entry point.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::{LogFormat, init};
