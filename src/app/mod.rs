//! Application module
//!
//! Configuration and logging setup for processes that host a task.

pub mod config;
pub mod logging;

pub use config::{TaskConfig, PHASE_ENV, VERBOSE_ENV};
pub use logging::{init_logging, init_tracing};
