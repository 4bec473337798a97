//! # Data Layer
//!
//! A MySQL instance in the isolated subnets.
//!
//! The only way in is TCP 3306 from the compute function's security group;
//! the database security group itself has no outbound traffic. Credentials
//! are generated into a secret that the function's role may read.

use serde_json::{json, Value};
use tracing::info;

use super::compute::Compute;
use super::iam::{allow, assume_role_policy, managed_policy_arn, policy_document};
use super::network::{Network, SubnetTier};
use crate::config::ResolvedConfig;
use crate::constants::{
    DATABASE_ALLOCATED_STORAGE_GB, DATABASE_MONITORING_INTERVAL_SECS, DATABASE_NAME,
    DATABASE_PORT, DATABASE_USERNAME, PERFORMANCE_INSIGHTS_RETENTION_DAYS,
};
use crate::error::StackError;
use crate::stack::StackBuilder;
use crate::template::{DeletionPolicy, Resource, ResourceHandle};

#[derive(Debug, Clone)]
pub struct Database {
    pub security_group: ResourceHandle,
    pub ingress: ResourceHandle,
    pub subnet_group: ResourceHandle,
    pub secret: ResourceHandle,
    pub instance: ResourceHandle,
    pub secret_read_policy: ResourceHandle,
}

impl Database {
    /// Endpoint address of the instance
    #[must_use]
    pub fn endpoint(&self) -> Value {
        self.instance.attr("Endpoint.Address")
    }
}

pub fn declare(
    builder: &mut StackBuilder,
    config: &ResolvedConfig,
    network: &Network,
    compute: &Compute,
) -> Result<Database, StackError> {
    let performance_insights = config.performance_insights_enabled();
    info!(
        instance_type = %config.rds_instance_type(),
        engine_version = %config.rds_engine_version,
        performance_insights,
        backup_retention_days = config.backup_retention_days,
        "declaring data layer"
    );

    let security_group = builder.declare(
        Resource::new("DatabaseSecurityGroup", "AWS::EC2::SecurityGroup").properties(json!({
            "GroupDescription": "Security group for the TAP database",
            "VpcId": network.vpc.reference(),
            // A rule matching no traffic: the group allows no egress at all
            "SecurityGroupEgress": [{
                "CidrIp": "255.255.255.255/32",
                "Description": "Disallow all traffic",
                "FromPort": 252,
                "IpProtocol": "icmp",
                "ToPort": 86
            }]
        })),
    )?;

    let ingress = builder.declare(
        Resource::new("DatabaseSecurityGroupIngressFromApiLambda", "AWS::EC2::SecurityGroupIngress")
            .properties(json!({
                "GroupId": security_group.attr("GroupId"),
                "IpProtocol": "tcp",
                "FromPort": DATABASE_PORT,
                "ToPort": DATABASE_PORT,
                "SourceSecurityGroupId": compute.security_group.attr("GroupId"),
                "Description": "Allow Lambda to connect to RDS"
            })),
    )?;

    let subnet_group = builder.declare(
        Resource::new("DatabaseSubnetGroup", "AWS::RDS::DBSubnetGroup").properties(json!({
            "DBSubnetGroupDescription": "Subnet group for the TAP database",
            "SubnetIds": network.subnet_refs(SubnetTier::PrivateIsolated)
        })),
    )?;

    let secret = builder.declare(
        Resource::new("TapDatabaseSecret", "AWS::SecretsManager::Secret")
            .properties(json!({
                "Description": "Generated credentials of the TAP database",
                "GenerateSecretString": {
                    "SecretStringTemplate": json!({ "username": DATABASE_USERNAME }).to_string(),
                    "GenerateStringKey": "password",
                    "PasswordLength": 30,
                    "ExcludeCharacters": " %+~`#$&*()|[]{}:;<>?!'/@\"\\"
                }
            }))
            .deletion_policy(DeletionPolicy::Delete),
    )?;

    let monitoring_role = builder.declare(
        Resource::new("TapDatabaseMonitoringRole", "AWS::IAM::Role").properties(json!({
            "AssumeRolePolicyDocument": assume_role_policy("monitoring.rds.amazonaws.com"),
            "ManagedPolicyArns": [
                managed_policy_arn("service-role/AmazonRDSEnhancedMonitoringRole")
            ]
        })),
    )?;

    let mut properties = json!({
        "DBInstanceClass": config.rds_instance_type(),
        "Engine": "mysql",
        "EngineVersion": config.rds_engine_version.as_str(),
        "DBName": DATABASE_NAME,
        "AllocatedStorage": DATABASE_ALLOCATED_STORAGE_GB.to_string(),
        "StorageType": "gp2",
        "StorageEncrypted": true,
        "DBSubnetGroupName": subnet_group.reference(),
        "VPCSecurityGroups": [security_group.attr("GroupId")],
        "MasterUsername": secret_field(&secret, "username"),
        "MasterUserPassword": secret_field(&secret, "password"),
        "BackupRetentionPeriod": config.backup_retention_days,
        "DeletionProtection": false,
        "PubliclyAccessible": false,
        "CopyTagsToSnapshot": true,
        "MonitoringInterval": DATABASE_MONITORING_INTERVAL_SECS,
        "MonitoringRoleArn": monitoring_role.attr("Arn"),
        "EnablePerformanceInsights": performance_insights
    });
    if let (true, Value::Object(map)) = (performance_insights, &mut properties) {
        map.insert(
            "PerformanceInsightsRetentionPeriod".to_string(),
            json!(PERFORMANCE_INSIGHTS_RETENTION_DAYS),
        );
    }

    let instance = builder.declare(
        Resource::new("TapDatabase", "AWS::RDS::DBInstance")
            .properties(properties)
            .deletion_policy(DeletionPolicy::Delete),
    )?;

    builder.declare(
        Resource::new("TapDatabaseSecretAttachment", "AWS::SecretsManager::SecretTargetAttachment")
            .properties(json!({
                "SecretId": secret.reference(),
                "TargetId": instance.reference(),
                "TargetType": "AWS::RDS::DBInstance"
            })),
    )?;

    let secret_read_policy = builder.declare(
        Resource::new("ApiLambdaSecretReadPolicy", "AWS::IAM::Policy").properties(json!({
            "PolicyName": "ApiLambdaSecretReadPolicy",
            "PolicyDocument": policy_document(vec![allow(
                &["secretsmanager:GetSecretValue", "secretsmanager:DescribeSecret"],
                vec![secret.reference()],
            )]),
            "Roles": [compute.role.reference()]
        })),
    )?;

    Ok(Database {
        security_group,
        ingress,
        subnet_group,
        secret,
        instance,
        secret_read_policy,
    })
}

/// Dynamic reference to a field of the generated secret
fn secret_field(secret: &ResourceHandle, key: &str) -> Value {
    json!({
        "Fn::Join": ["", [
            "{{resolve:secretsmanager:",
            secret.reference(),
            format!(":SecretString:{key}::}}}}")
        ]]
    })
}
