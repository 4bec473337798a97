//! # Constants
//!
//! Shared constants used throughout the stack definition.
//!
//! Configuration defaults live next to the values they describe in
//! [`crate::config::types`]; the numbers here are the fixed parts of the
//! architecture that callers cannot override.

/// Project name used as the first segment of every derived name
pub const PROJECT_NAME: &str = "tap";

/// CloudFormation template format version
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Template description
pub const TEMPLATE_DESCRIPTION: &str =
    "TAP web application: network, static site, serverless API, database and delivery pipeline";

/// Default backup retention for the database (days)
pub const DEFAULT_BACKUP_RETENTION_DAYS: u32 = 7;

/// RDS rejects backup retention above this value (days)
pub const MAX_BACKUP_RETENTION_DAYS: u32 = 35;

// Network

/// Address space of the VPC
pub const VPC_CIDR: &str = "10.0.0.0/16";

/// Number of availability zones the network spans
pub const AVAILABILITY_ZONES: usize = 2;

/// Number of NAT gateways (egress for the private tier)
pub const NAT_GATEWAYS: usize = 1;

/// Prefix length of every subnet
pub const SUBNET_CIDR_MASK: u8 = 24;

// Compute

/// Function timeout (seconds)
pub const FUNCTION_TIMEOUT_SECS: u32 = 30;

/// Function memory (MB)
pub const FUNCTION_MEMORY_MB: u32 = 256;

/// Stage name of the API deployment
pub const API_STAGE_NAME: &str = "prod";

/// Request headers allowed by the API's CORS policy
pub const CORS_ALLOWED_HEADERS: [&str; 5] = [
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Request-ID",
];

/// Methods advertised by the API's CORS preflight response
pub const CORS_ALLOWED_METHODS: [&str; 7] =
    ["OPTIONS", "GET", "PUT", "POST", "DELETE", "PATCH", "HEAD"];

/// Retention of the API access log group (days)
pub const API_ACCESS_LOG_RETENTION_DAYS: u32 = 30;

// Database

/// MySQL listener port
pub const DATABASE_PORT: u16 = 3306;

/// Initial database schema name
pub const DATABASE_NAME: &str = "tapdb";

/// Username stored in the generated credential secret
pub const DATABASE_USERNAME: &str = "admin";

/// Allocated storage (GiB)
pub const DATABASE_ALLOCATED_STORAGE_GB: u32 = 100;

/// Enhanced monitoring interval (seconds)
pub const DATABASE_MONITORING_INTERVAL_SECS: u32 = 60;

/// Performance Insights retention when enabled (days)
pub const PERFORMANCE_INSIGHTS_RETENTION_DAYS: u32 = 7;

// Pipeline

/// Object key the external uploader writes the source archive to
pub const PIPELINE_SOURCE_KEY: &str = "source.zip";

// Alarms

/// Length of one alarm evaluation window (seconds)
pub const ALARM_PERIOD_SECS: u32 = 300;

/// Consecutive breaching windows before an alarm fires
pub const ALARM_EVALUATION_PERIODS: u32 = 2;

// Site

/// Document served for `/` and for unknown paths
pub const WEBSITE_INDEX_DOCUMENT: &str = "index.html";

/// Error document of the bucket's website configuration
pub const WEBSITE_ERROR_DOCUMENT: &str = "error.html";

/// Managed CloudFront "CachingOptimized" cache policy
pub const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";
