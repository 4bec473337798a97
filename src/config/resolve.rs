//! # Configuration Resolver
//!
//! Turns partial [`StackProps`] into a complete [`ResolvedConfig`].
//!
//! Resolution is `caller.field ?? default.field` for every field. Flags and
//! numbers keep explicit zero values (`false`, `0`): only an absent field
//! falls back.

use serde::Serialize;

use super::props::StackProps;
use super::types::{
    BuildImage, ComputeType, InstanceClass, InstanceSize, LambdaRuntime, MysqlEngineVersion,
};
use crate::constants::DEFAULT_BACKUP_RETENTION_DAYS;

/// Fully resolved configuration consumed by every layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub environment_suffix: String,
    pub lambda_runtime: LambdaRuntime,
    pub rds_engine_version: MysqlEngineVersion,
    pub rds_instance_class: InstanceClass,
    pub rds_instance_size: InstanceSize,
    pub codebuild_image: BuildImage,
    pub codebuild_compute_type: ComputeType,
    pub backup_retention_days: u32,
    #[serde(rename = "enableXRayTracing")]
    pub enable_xray_tracing: bool,
    pub enable_cloud_watch_alarms: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            environment_suffix: String::new(),
            lambda_runtime: LambdaRuntime::default(),
            rds_engine_version: MysqlEngineVersion::default(),
            rds_instance_class: InstanceClass::default(),
            rds_instance_size: InstanceSize::default(),
            codebuild_image: BuildImage::default(),
            codebuild_compute_type: ComputeType::default(),
            backup_retention_days: DEFAULT_BACKUP_RETENTION_DAYS,
            enable_xray_tracing: true,
            enable_cloud_watch_alarms: true,
        }
    }
}

/// Resolve caller props against the built-in defaults
#[must_use]
pub fn resolve(props: &StackProps) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();
    ResolvedConfig {
        environment_suffix: props
            .environment_suffix
            .clone()
            .unwrap_or(defaults.environment_suffix),
        lambda_runtime: props.lambda_runtime.unwrap_or(defaults.lambda_runtime),
        rds_engine_version: props.rds_engine_version.unwrap_or(defaults.rds_engine_version),
        rds_instance_class: props.rds_instance_class.unwrap_or(defaults.rds_instance_class),
        rds_instance_size: props.rds_instance_size.unwrap_or(defaults.rds_instance_size),
        codebuild_image: props.codebuild_image.unwrap_or(defaults.codebuild_image),
        codebuild_compute_type: props
            .codebuild_compute_type
            .unwrap_or(defaults.codebuild_compute_type),
        backup_retention_days: props
            .backup_retention_days
            .unwrap_or(defaults.backup_retention_days),
        enable_xray_tracing: props.enable_xray_tracing.unwrap_or(defaults.enable_xray_tracing),
        enable_cloud_watch_alarms: props
            .enable_cloud_watch_alarms
            .unwrap_or(defaults.enable_cloud_watch_alarms),
    }
}

impl ResolvedConfig {
    /// Performance Insights is unavailable on the smallest class/size pair.
    /// Evaluated from the resolved sizing every time, never cached.
    #[must_use]
    pub fn performance_insights_enabled(&self) -> bool {
        supports_performance_insights(self.rds_instance_class, self.rds_instance_size)
    }

    /// Provider instance type string, e.g. `db.t3.micro`
    #[must_use]
    pub fn rds_instance_type(&self) -> String {
        format!("db.{}.{}", self.rds_instance_class, self.rds_instance_size)
    }
}

#[must_use]
pub fn supports_performance_insights(class: InstanceClass, size: InstanceSize) -> bool {
    !(class == InstanceClass::SMALLEST && size == InstanceSize::SMALLEST)
}
