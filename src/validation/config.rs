//! # Configuration Validation
//!
//! Everything in [`ResolvedConfig`] is a closed set except the backup
//! retention, and the names derived from the environment suffix.

use super::{validate_bucket_name, validate_environment_suffix};
use crate::config::{ResolvedConfig, StackEnvironment};
use crate::constants::MAX_BACKUP_RETENTION_DAYS;
use crate::error::StackError;
use crate::naming::BucketRole;

pub fn validate_config(
    config: &ResolvedConfig,
    environment: &StackEnvironment,
) -> Result<(), StackError> {
    validate_environment_suffix(&config.environment_suffix)?;

    if config.backup_retention_days > MAX_BACKUP_RETENTION_DAYS {
        return Err(StackError::InvalidConfig(format!(
            "backupRetentionDays must be between 0 and {MAX_BACKUP_RETENTION_DAYS} (got {})",
            config.backup_retention_days
        )));
    }

    let names = environment.names(&config.environment_suffix);
    for role in BucketRole::ALL {
        validate_bucket_name(&names.bucket(role)?)?;
    }

    Ok(())
}
