//! IAM policy document helpers shared by the layers.

use serde_json::{json, Value};

use crate::template::intrinsic::sub;
use crate::template::ResourceHandle;

/// Trust policy letting an AWS service assume a role
#[must_use]
pub fn assume_role_policy(service: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service },
            "Action": "sts:AssumeRole"
        }]
    })
}

/// ARN of an AWS managed policy, partition-aware
#[must_use]
pub fn managed_policy_arn(name: &str) -> Value {
    sub(format!("arn:${{AWS::Partition}}:iam::aws:policy/{name}"))
}

/// An `Allow` statement
#[must_use]
pub fn allow(actions: &[&str], resources: Vec<Value>) -> Value {
    json!({
        "Effect": "Allow",
        "Action": actions,
        "Resource": resources
    })
}

#[must_use]
pub fn policy_document(statements: Vec<Value>) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": statements
    })
}

/// ARN pattern covering every object in a bucket
#[must_use]
pub fn bucket_objects_arn(bucket: &ResourceHandle) -> Value {
    sub(format!("${{{}.Arn}}/*", bucket.logical_id()))
}
