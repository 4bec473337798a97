//! # Environment Validation
//!
//! Validates account ids, region names and environment suffixes.

use regex::Regex;

use crate::config::StackEnvironment;
use crate::error::StackError;

fn compile(pattern: &str) -> Result<Regex, StackError> {
    Regex::new(pattern)
        .map_err(|e| StackError::InvalidEnvironment(format!("Failed to compile regex: {e}")))
}

/// Validate an AWS account id
/// Format: exactly 12 digits
pub fn validate_account(account: &str) -> Result<(), StackError> {
    let account_trimmed = account.trim();

    if account_trimmed.is_empty() {
        return Err(StackError::InvalidEnvironment(
            "account cannot be empty".to_string(),
        ));
    }

    if !compile(r"^[0-9]{12}$")?.is_match(account_trimmed) {
        return Err(StackError::InvalidEnvironment(format!(
            "account '{account_trimmed}' must be exactly 12 digits"
        )));
    }

    Ok(())
}

/// Validate a region name
/// Format: partition-qualified location and index, e.g. `us-east-1`, `us-gov-west-1`
pub fn validate_region(region: &str) -> Result<(), StackError> {
    let region_trimmed = region.trim();

    if region_trimmed.is_empty() {
        return Err(StackError::InvalidEnvironment(
            "region cannot be empty".to_string(),
        ));
    }

    if !compile(r"^[a-z]{2}(-[a-z]+)+-[0-9]+$")?.is_match(region_trimmed) {
        return Err(StackError::InvalidEnvironment(format!(
            "region '{region_trimmed}' must look like 'us-east-1'"
        )));
    }

    Ok(())
}

/// Validate an environment suffix
/// Format: lowercase alphanumeric and hyphens, cannot start/end with hyphen.
/// Empty is allowed and means "no suffix".
pub fn validate_environment_suffix(suffix: &str) -> Result<(), StackError> {
    if suffix.is_empty() {
        return Ok(());
    }

    if !compile(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$")?.is_match(suffix) {
        return Err(StackError::InvalidEnvironment(format!(
            "environment suffix '{suffix}' must be lowercase alphanumeric and hyphens (cannot start/end with hyphen)"
        )));
    }

    Ok(())
}

pub fn validate_environment(environment: &StackEnvironment) -> Result<(), StackError> {
    validate_account(&environment.account)?;
    validate_region(&environment.region)
}
