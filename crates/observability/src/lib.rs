//! Tracing and operation logging (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init();
}

/// Operation logging decorator.
pub mod operation;

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::operation::observe;
pub use self::tracing::{init_with, LogFormat};
