//! # Errors
//!
//! Error type returned by every fallible step of stack synthesis.
//!
//! Synthesis is all-or-nothing: any of these aborts the build and no template
//! is produced.

use std::path::PathBuf;
use thiserror::Error;

use crate::naming::NamingError;

#[derive(Debug, Error)]
pub enum StackError {
    /// A declaration referenced a logical id that has not been declared yet
    #[error("resource '{from}' references '{to}', which has not been declared")]
    UndeclaredReference { from: String, to: String },

    #[error("logical id '{0}' is declared more than once")]
    DuplicateLogicalId(String),

    /// Account, region or environment suffix failed validation
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),

    /// Resolved configuration is outside what the provider accepts
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid pipeline wiring: {0}")]
    InvalidPipelineWiring(String),

    #[error("cannot allocate /{mask} subnet #{index} inside {cidr}")]
    CidrExhausted { cidr: String, mask: u8, index: usize },

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("failed to read props file {path}: {message}")]
    PropsFile { path: PathBuf, message: String },

    #[error("failed to render template: {0}")]
    Render(String),

    /// Account or region could not be discovered from the AWS environment
    #[error("failed to discover AWS environment: {0}")]
    EnvironmentLookup(String),
}

pub type Result<T, E = StackError> = std::result::Result<T, E>;
