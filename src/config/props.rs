//! # Stack Props
//!
//! The caller-facing, partial configuration. Every field is optional; absent
//! fields fall back to the defaults applied by [`super::resolve`].
//!
//! ## Example (YAML)
//!
//! ```yaml
//! environmentSuffix: dev
//! rdsInstanceClass: t4g
//! rdsInstanceSize: small
//! enableCloudWatchAlarms: false
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::types::{
    BuildImage, ComputeType, InstanceClass, InstanceSize, LambdaRuntime, MysqlEngineVersion,
};
use crate::error::StackError;

/// Partial stack configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackProps {
    /// Suffix appended to every derived name (e.g. "dev", "pr42"). Empty means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_suffix: Option<String>,
    /// Function runtime (defaults to nodejs18.x)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_runtime: Option<LambdaRuntime>,
    /// MySQL engine version (defaults to 8.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rds_engine_version: Option<MysqlEngineVersion>,
    /// Database instance class (defaults to t3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rds_instance_class: Option<InstanceClass>,
    /// Database instance size (defaults to micro)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rds_instance_size: Option<InstanceSize>,
    /// CodeBuild image (defaults to aws/codebuild/standard:5.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codebuild_image: Option<BuildImage>,
    /// CodeBuild compute type (defaults to BUILD_GENERAL1_SMALL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codebuild_compute_type: Option<ComputeType>,
    /// Database backup retention in days (defaults to 7)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention_days: Option<u32>,
    /// Distributed tracing on the function and the API stage (defaults to true)
    #[serde(default, rename = "enableXRayTracing", skip_serializing_if = "Option::is_none")]
    pub enable_xray_tracing: Option<bool>,
    /// Threshold alarms on function, API and database metrics (defaults to true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_cloud_watch_alarms: Option<bool>,
}

impl StackProps {
    /// Load props from a YAML or JSON file (JSON is valid YAML)
    pub fn from_file(path: &Path) -> Result<Self, StackError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StackError::PropsFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&contents).map_err(|e| match e {
            StackError::PropsFile { message, .. } => StackError::PropsFile {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, StackError> {
        // An empty document means "no overrides"
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| StackError::PropsFile {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Layer `overrides` on top of `self`: every field set in `overrides` wins
    #[must_use]
    pub fn merged_with(self, overrides: StackProps) -> StackProps {
        StackProps {
            environment_suffix: overrides.environment_suffix.or(self.environment_suffix),
            lambda_runtime: overrides.lambda_runtime.or(self.lambda_runtime),
            rds_engine_version: overrides.rds_engine_version.or(self.rds_engine_version),
            rds_instance_class: overrides.rds_instance_class.or(self.rds_instance_class),
            rds_instance_size: overrides.rds_instance_size.or(self.rds_instance_size),
            codebuild_image: overrides.codebuild_image.or(self.codebuild_image),
            codebuild_compute_type: overrides
                .codebuild_compute_type
                .or(self.codebuild_compute_type),
            backup_retention_days: overrides.backup_retention_days.or(self.backup_retention_days),
            enable_xray_tracing: overrides.enable_xray_tracing.or(self.enable_xray_tracing),
            enable_cloud_watch_alarms: overrides
                .enable_cloud_watch_alarms
                .or(self.enable_cloud_watch_alarms),
        }
    }
}
