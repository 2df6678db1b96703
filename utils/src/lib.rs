//! Shared utilities for the TRON wallet toolkit.

pub mod logging;

pub use logging::{init_logging, LogFormat};
