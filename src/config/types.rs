//! # Configuration Value Types
//!
//! Closed sets of values the stack accepts for runtimes, engine versions,
//! instance sizing and build environments. Each serializes to the exact
//! string the provider expects, so props files use provider spelling
//! (`nodejs18.x`, `t3`, `BUILD_GENERAL1_SMALL`, ...).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Function runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, JsonSchema)]
pub enum LambdaRuntime {
    #[default]
    #[serde(rename = "nodejs18.x")]
    Nodejs18x,
    #[serde(rename = "nodejs20.x")]
    Nodejs20x,
    #[serde(rename = "nodejs22.x")]
    Nodejs22x,
}

impl LambdaRuntime {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LambdaRuntime::Nodejs18x => "nodejs18.x",
            LambdaRuntime::Nodejs20x => "nodejs20.x",
            LambdaRuntime::Nodejs22x => "nodejs22.x",
        }
    }

    /// `runtime-versions` entry for the build spec's install phase
    #[must_use]
    pub fn build_runtime_version(&self) -> (&'static str, &'static str) {
        match self {
            LambdaRuntime::Nodejs18x => ("nodejs", "18"),
            LambdaRuntime::Nodejs20x => ("nodejs", "20"),
            LambdaRuntime::Nodejs22x => ("nodejs", "22"),
        }
    }
}

/// MySQL engine version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, JsonSchema)]
pub enum MysqlEngineVersion {
    #[default]
    #[serde(rename = "8.0")]
    Ver8_0,
    #[serde(rename = "8.0.39")]
    Ver8_0_39,
    #[serde(rename = "8.0.40")]
    Ver8_0_40,
    #[serde(rename = "8.4")]
    Ver8_4,
}

impl MysqlEngineVersion {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MysqlEngineVersion::Ver8_0 => "8.0",
            MysqlEngineVersion::Ver8_0_39 => "8.0.39",
            MysqlEngineVersion::Ver8_0_40 => "8.0.40",
            MysqlEngineVersion::Ver8_4 => "8.4",
        }
    }
}

/// Database instance class, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InstanceClass {
    #[default]
    T3,
    T4g,
    M5,
    M6g,
    R5,
    R6g,
}

impl InstanceClass {
    /// The cheapest burstable class
    pub const SMALLEST: InstanceClass = InstanceClass::T3;

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceClass::T3 => "t3",
            InstanceClass::T4g => "t4g",
            InstanceClass::M5 => "m5",
            InstanceClass::M6g => "m6g",
            InstanceClass::R5 => "r5",
            InstanceClass::R6g => "r6g",
        }
    }
}

/// Database instance size, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InstanceSize {
    #[default]
    Micro,
    Small,
    Medium,
    Large,
    Xlarge,
    #[serde(rename = "2xlarge")]
    Xlarge2,
}

impl InstanceSize {
    pub const SMALLEST: InstanceSize = InstanceSize::Micro;

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceSize::Micro => "micro",
            InstanceSize::Small => "small",
            InstanceSize::Medium => "medium",
            InstanceSize::Large => "large",
            InstanceSize::Xlarge => "xlarge",
            InstanceSize::Xlarge2 => "2xlarge",
        }
    }
}

/// CodeBuild image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, JsonSchema)]
pub enum BuildImage {
    #[default]
    #[serde(rename = "aws/codebuild/standard:5.0")]
    Standard5_0,
    #[serde(rename = "aws/codebuild/standard:6.0")]
    Standard6_0,
    #[serde(rename = "aws/codebuild/standard:7.0")]
    Standard7_0,
    #[serde(rename = "aws/codebuild/amazonlinux2-x86_64-standard:5.0")]
    AmazonLinux2Standard5_0,
}

impl BuildImage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildImage::Standard5_0 => "aws/codebuild/standard:5.0",
            BuildImage::Standard6_0 => "aws/codebuild/standard:6.0",
            BuildImage::Standard7_0 => "aws/codebuild/standard:7.0",
            BuildImage::AmazonLinux2Standard5_0 => {
                "aws/codebuild/amazonlinux2-x86_64-standard:5.0"
            }
        }
    }
}

/// CodeBuild compute type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, JsonSchema)]
pub enum ComputeType {
    #[default]
    #[serde(rename = "BUILD_GENERAL1_SMALL")]
    Small,
    #[serde(rename = "BUILD_GENERAL1_MEDIUM")]
    Medium,
    #[serde(rename = "BUILD_GENERAL1_LARGE")]
    Large,
}

impl ComputeType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeType::Small => "BUILD_GENERAL1_SMALL",
            ComputeType::Medium => "BUILD_GENERAL1_MEDIUM",
            ComputeType::Large => "BUILD_GENERAL1_LARGE",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })+
    };
}

display_as_str!(
    LambdaRuntime,
    MysqlEngineVersion,
    InstanceClass,
    InstanceSize,
    BuildImage,
    ComputeType
);
