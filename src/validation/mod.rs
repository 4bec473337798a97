//! # Validation
//!
//! Checks run before any resource is declared: the target environment, the
//! derived bucket names and the resolved configuration.

mod config;
mod environment;
mod names;

pub use config::validate_config;
pub use environment::{
    validate_account, validate_environment, validate_environment_suffix, validate_region,
};
pub use names::validate_bucket_name;
