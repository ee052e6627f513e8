//! Tracing and logging (shared setup).

pub use crate::tracing::{LogConfig, LogFormat};

/// Initialize process-wide logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&LogConfig::from_env());
}

/// Subscriber configuration (filters, output format).
pub mod tracing;
