//! # Observability
//!
//! Logging setup for the command-line tools.
//!
//! - `logging`: `tracing` subscriber configured from [`crate::config::LogSettings`]

pub mod logging;

pub use logging::init_logging;
