//! # Buckets
//!
//! Hardened, fully removable S3 buckets.
//!
//! Every bucket is versioned, SSE-S3 encrypted and blocks all public access.
//! Deletion must not require emptying the bucket by hand, so a shared
//! provider function is declared once and each bucket gets a
//! `Custom::S3AutoDeleteObjects` resource that empties it on teardown, plus a
//! bucket policy letting the provider's role do so.

use serde_json::{json, Value};
use tracing::info;

use super::iam::{allow, assume_role_policy, bucket_objects_arn, managed_policy_arn};
use crate::error::StackError;
use crate::stack::StackBuilder;
use crate::template::{DeletionPolicy, Resource, ResourceHandle};

const PROVIDER_ID: &str = "AutoDeleteObjectsProvider";
const PROVIDER_RUNTIME: &str = "nodejs20.x";
const PROVIDER_TIMEOUT_SECS: u32 = 900;
const PROVIDER_SOURCE: &str = include_str!("assets/auto_delete_objects.js");

/// The shared bucket-emptying function and its role
#[derive(Debug, Clone)]
pub struct AutoDeleteProvider {
    pub role: ResourceHandle,
    pub function: ResourceHandle,
}

impl AutoDeleteProvider {
    /// Declare the provider; must precede the first bucket
    pub fn declare(builder: &mut StackBuilder) -> Result<Self, StackError> {
        let role = builder.declare(
            Resource::new(format!("{PROVIDER_ID}Role"), "AWS::IAM::Role").properties(json!({
                "AssumeRolePolicyDocument": assume_role_policy("lambda.amazonaws.com"),
                "ManagedPolicyArns": [
                    managed_policy_arn("service-role/AWSLambdaBasicExecutionRole")
                ]
            })),
        )?;

        let function = builder.declare(
            Resource::new(format!("{PROVIDER_ID}Handler"), "AWS::Lambda::Function")
                .properties(json!({
                    "Code": { "ZipFile": PROVIDER_SOURCE },
                    "Handler": "index.handler",
                    "Runtime": PROVIDER_RUNTIME,
                    "Timeout": PROVIDER_TIMEOUT_SECS,
                    "MemorySize": 128,
                    "Role": role.attr("Arn"),
                    "Description": "Empties versioned buckets before they are deleted"
                }))
                .depends_on(&role),
        )?;

        Ok(Self { role, function })
    }
}

/// Static website hosting settings of a bucket
#[derive(Debug, Clone, Copy)]
pub struct WebsiteConfig<'a> {
    pub index_document: &'a str,
    pub error_document: &'a str,
}

/// A declared bucket
#[derive(Debug, Clone)]
pub struct Bucket {
    pub name: String,
    pub bucket: ResourceHandle,
    pub policy: ResourceHandle,
    pub auto_delete: ResourceHandle,
}

/// Declare a hardened bucket together with its auto-delete wiring
pub fn declare_bucket(
    builder: &mut StackBuilder,
    provider: &AutoDeleteProvider,
    logical_id: &str,
    name: String,
    website: Option<WebsiteConfig<'_>>,
) -> Result<Bucket, StackError> {
    info!(bucket = %name, logical_id, "declaring bucket");

    let mut properties = json!({
        "BucketName": name,
        "BucketEncryption": {
            "ServerSideEncryptionConfiguration": [{
                "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" }
            }]
        },
        "PublicAccessBlockConfiguration": {
            "BlockPublicAcls": true,
            "BlockPublicPolicy": true,
            "IgnorePublicAcls": true,
            "RestrictPublicBuckets": true
        },
        "VersioningConfiguration": { "Status": "Enabled" },
        "Tags": [{ "Key": "tap:auto-delete-objects", "Value": "true" }]
    });
    if let (Some(site), Value::Object(map)) = (website, &mut properties) {
        map.insert(
            "WebsiteConfiguration".to_string(),
            json!({
                "IndexDocument": site.index_document,
                "ErrorDocument": site.error_document
            }),
        );
    }

    let bucket = builder.declare(
        Resource::new(logical_id, "AWS::S3::Bucket")
            .properties(properties)
            .deletion_policy(DeletionPolicy::Delete),
    )?;

    let policy = builder.declare(
        Resource::new(format!("{logical_id}Policy"), "AWS::S3::BucketPolicy").properties(json!({
            "Bucket": bucket.reference(),
            "PolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "AWS": provider.role.attr("Arn") },
                    "Action": [
                        "s3:DeleteObject*",
                        "s3:GetBucket*",
                        "s3:List*",
                        "s3:PutBucketPolicy"
                    ],
                    "Resource": [bucket.attr("Arn"), bucket_objects_arn(&bucket)]
                }]
            }
        })),
    )?;

    let auto_delete = builder.declare(
        Resource::new(format!("{logical_id}AutoDeleteObjects"), "Custom::S3AutoDeleteObjects")
            .properties(json!({
                "ServiceToken": provider.function.attr("Arn"),
                "BucketName": bucket.reference()
            }))
            .depends_on(&policy)
            .deletion_policy(DeletionPolicy::Delete),
    )?;

    Ok(Bucket {
        name,
        bucket,
        policy,
        auto_delete,
    })
}

/// Role statement granting object read/write on the given buckets only
#[must_use]
pub fn object_read_write(buckets: &[&ResourceHandle]) -> Value {
    allow(
        &["s3:GetObject", "s3:PutObject", "s3:GetObjectVersion"],
        buckets.iter().map(|b| bucket_objects_arn(b)).collect(),
    )
}
