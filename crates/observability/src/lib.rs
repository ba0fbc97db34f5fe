//! Logging setup shared by the `kasir` binary and tests.

pub mod tracing;

pub use crate::tracing::{LogFormat, UnknownLogFormat};

/// Install process-wide logging in `format`; later calls do nothing.
pub fn init(format: LogFormat) {
    tracing::init(format);
}
