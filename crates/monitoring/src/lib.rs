//! Logging initialization shared by embedding hosts and tests.

pub mod logging;

pub use logging::{init_logging, LogGuard};
