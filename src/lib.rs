//! # TAP Stack
//!
//! Synthesizes the CloudFormation template of the TAP web application: an
//! isolated VPC, a static site behind a CDN, a serverless REST API, a MySQL
//! database, and a delivery pipeline from an uploaded source archive to the
//! site bucket.
//!
//! ```rust
//! use tap_stack::config::{StackEnvironment, StackProps};
//! use tap_stack::stack::synthesize;
//!
//! let props = StackProps {
//!     environment_suffix: Some("dev".to_string()),
//!     enable_cloud_watch_alarms: Some(false),
//!     ..StackProps::default()
//! };
//! let stack = synthesize(&props, &StackEnvironment::new("111122223333", "us-east-1")).unwrap();
//! assert_eq!(stack.name, "tap-dev");
//! assert!(stack.template.resources_of_type("AWS::CloudWatch::Alarm").next().is_none());
//! ```
//!
//! ## Module Structure
//!
//! - `config` - Props, resolution against defaults, target environment, tool settings
//! - `naming` - Derived stack and bucket names
//! - `validation` - Environment and configuration checks run before declaration
//! - `template` - Template model, intrinsic functions and rendering
//! - `stack` - The declaration builder and [`stack::synthesize`]
//! - `layers` - Network, edge, compute, API, data, pipeline, alarms and outputs
//! - `aws` - Account and region discovery for the CLI
//! - `observability` - Logging setup

pub mod aws;
pub mod config;
pub mod constants;
pub mod error;
pub mod layers;
pub mod naming;
pub mod observability;
pub mod stack;
pub mod template;
pub mod validation;

pub use error::{Result, StackError};
