//! # Name Validation

use regex::Regex;

use crate::error::StackError;

/// Validate an S3 bucket name
/// Format: lowercase alphanumeric, hyphens, dots; starts and ends alphanumeric
/// Length: 3-63 characters
pub fn validate_bucket_name(name: &str) -> Result<(), StackError> {
    if name.len() < 3 || name.len() > 63 {
        return Err(StackError::InvalidConfig(format!(
            "bucket name '{}' must be 3-63 characters long (got {})",
            name,
            name.len()
        )));
    }

    let bucket_regex = Regex::new(r"^[a-z0-9][a-z0-9.-]*[a-z0-9]$")
        .map_err(|e| StackError::InvalidConfig(format!("Failed to compile regex: {e}")))?;

    if !bucket_regex.is_match(name) || name.contains("..") {
        return Err(StackError::InvalidConfig(format!(
            "bucket name '{name}' must be lowercase alphanumeric, hyphens and dots, starting and ending with a letter or digit"
        )));
    }

    Ok(())
}
