//! # Naming
//!
//! Deterministic name derivation for the stack and its buckets.
//!
//! Bucket names must be globally unique, so they embed the account and the
//! region; the optional environment suffix keeps environments apart. An empty
//! suffix is dropped together with its separator.
//!
//! ```rust
//! use tap_stack::naming::{BucketRole, NameBuilder};
//!
//! let name = NameBuilder::new()
//!     .account("111122223333")
//!     .region("us-east-1")
//!     .environment_suffix("dev")
//!     .bucket(BucketRole::Website)
//!     .unwrap();
//! assert_eq!(name, "tap-website-111122223333-us-east-1-dev");
//! ```

use thiserror::Error;

use crate::constants::PROJECT_NAME;

/// Errors that can occur while deriving a name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("missing required naming parameter: {0}")]
    MissingRequiredParameter(&'static str),
}

/// The buckets this stack owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketRole {
    /// Built site, origin of the distribution and target of the deploy stage
    Website,
    /// Pipeline artifact store
    PipelineArtifacts,
    /// Hand-off point for source archives
    PipelineSource,
}

impl BucketRole {
    pub const ALL: [BucketRole; 3] = [
        BucketRole::Website,
        BucketRole::PipelineArtifacts,
        BucketRole::PipelineSource,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketRole::Website => "website",
            BucketRole::PipelineArtifacts => "pipeline-artifacts",
            BucketRole::PipelineSource => "pipeline-source",
        }
    }
}

/// Builder for stack-scoped names
#[derive(Debug, Clone, Default)]
pub struct NameBuilder {
    account: Option<String>,
    region: Option<String>,
    suffix: Option<String>,
}

impl NameBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Environment suffix; an empty string is the same as no suffix
    #[must_use]
    pub fn environment_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = if suffix.is_empty() { None } else { Some(suffix) };
        self
    }

    /// `tap` or `tap-{suffix}`
    #[must_use]
    pub fn stack_prefix(&self) -> String {
        self.with_suffix(PROJECT_NAME.to_string())
    }

    /// `{prefix}-{name}`, e.g. `tap-dev-api`
    #[must_use]
    pub fn resource(&self, name: &str) -> String {
        format!("{}-{name}", self.stack_prefix())
    }

    /// `tap-{role}-{account}-{region}[-{suffix}]`
    pub fn bucket(&self, role: BucketRole) -> Result<String, NamingError> {
        let account = self
            .account
            .as_deref()
            .ok_or(NamingError::MissingRequiredParameter("account"))?;
        let region = self
            .region
            .as_deref()
            .ok_or(NamingError::MissingRequiredParameter("region"))?;

        Ok(self.with_suffix(format!(
            "{PROJECT_NAME}-{}-{account}-{region}",
            role.as_str()
        )))
    }

    fn with_suffix(&self, base: String) -> String {
        match &self.suffix {
            Some(suffix) => format!("{base}-{suffix}"),
            None => base,
        }
    }
}
