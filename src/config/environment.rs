//! # Stack Environment
//!
//! The deployment target a template is synthesized for. Account and region
//! are part of every bucket name, so they must be concrete at synthesis time.

use serde::Serialize;

use crate::naming::NameBuilder;

/// Target account and region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackEnvironment {
    pub account: String,
    pub region: String,
}

impl StackEnvironment {
    #[must_use]
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }

    /// Name builder scoped to this environment and the given suffix
    #[must_use]
    pub fn names(&self, environment_suffix: &str) -> NameBuilder {
        NameBuilder::new()
            .account(&self.account)
            .region(&self.region)
            .environment_suffix(environment_suffix)
    }
}
