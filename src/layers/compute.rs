//! # Compute
//!
//! The API function, its execution role and its security group. The function
//! runs in the private (egress-only) subnets; the database layer later opens
//! its port to this function's security group and nothing else.

use serde_json::{json, Value};
use tracing::info;

use super::iam::{assume_role_policy, managed_policy_arn};
use super::network::{Network, SubnetTier};
use crate::config::ResolvedConfig;
use crate::constants::{FUNCTION_MEMORY_MB, FUNCTION_TIMEOUT_SECS};
use crate::error::StackError;
use crate::stack::StackBuilder;
use crate::template::{Resource, ResourceHandle};

const HANDLER_SOURCE: &str = include_str!("assets/api_handler.js");

#[derive(Debug, Clone)]
pub struct Compute {
    pub role: ResourceHandle,
    pub security_group: ResourceHandle,
    pub function: ResourceHandle,
}

/// X-Ray tracing mode of the function
#[must_use]
pub fn tracing_mode(enabled: bool) -> &'static str {
    if enabled {
        "Active"
    } else {
        "PassThrough"
    }
}

pub fn declare(
    builder: &mut StackBuilder,
    config: &ResolvedConfig,
    network: &Network,
) -> Result<Compute, StackError> {
    info!(
        runtime = %config.lambda_runtime,
        tracing = config.enable_xray_tracing,
        "declaring compute layer"
    );

    let mut managed_policies: Vec<Value> = vec![
        managed_policy_arn("service-role/AWSLambdaBasicExecutionRole"),
        managed_policy_arn("service-role/AWSLambdaVPCAccessExecutionRole"),
    ];
    if config.enable_xray_tracing {
        managed_policies.push(managed_policy_arn("AWSXRayDaemonWriteAccess"));
    }

    let role = builder.declare(
        Resource::new("ApiLambdaServiceRole", "AWS::IAM::Role").properties(json!({
            "AssumeRolePolicyDocument": assume_role_policy("lambda.amazonaws.com"),
            "ManagedPolicyArns": managed_policies
        })),
    )?;

    let security_group = builder.declare(
        Resource::new("ApiLambdaSecurityGroup", "AWS::EC2::SecurityGroup").properties(json!({
            "GroupDescription": "Security group for the API function",
            "VpcId": network.vpc.reference(),
            "SecurityGroupEgress": [{
                "CidrIp": "0.0.0.0/0",
                "Description": "Allow all outbound traffic by default",
                "IpProtocol": "-1"
            }]
        })),
    )?;

    let mut function = Resource::new("ApiLambda", "AWS::Lambda::Function")
        .properties(json!({
            "Code": { "ZipFile": HANDLER_SOURCE },
            "Handler": "index.handler",
            "Runtime": config.lambda_runtime.as_str(),
            "Role": role.attr("Arn"),
            "Timeout": FUNCTION_TIMEOUT_SECS,
            "MemorySize": FUNCTION_MEMORY_MB,
            "Environment": { "Variables": { "NODE_ENV": "production" } },
            "TracingConfig": { "Mode": tracing_mode(config.enable_xray_tracing) },
            "VpcConfig": {
                "SecurityGroupIds": [security_group.attr("GroupId")],
                "SubnetIds": network.subnet_refs(SubnetTier::PrivateWithEgress)
            }
        }))
        .depends_on(&role);
    for route in &network.egress_routes {
        function = function.depends_on(route);
    }
    let function = builder.declare(function)?;

    Ok(Compute {
        role,
        security_group,
        function,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, StackProps};
    use crate::template::Template;

    fn compute(tracing: bool) -> (Network, Compute, Template) {
        let mut builder = StackBuilder::default();
        let network = crate::layers::network::declare(&mut builder, "tap").unwrap();
        let config = resolve(&StackProps {
            enable_xray_tracing: Some(tracing),
            ..StackProps::default()
        });
        let compute = declare(&mut builder, &config, &network).unwrap();
        (network, compute, builder.finish())
    }

    #[test]
    fn test_function_settings() {
        let (network, compute, template) = compute(true);
        let function = template.resource(compute.function.logical_id()).unwrap();
        assert_eq!(function.property("/Runtime"), Some(&json!("nodejs18.x")));
        assert_eq!(function.property("/Handler"), Some(&json!("index.handler")));
        assert_eq!(function.property("/Timeout"), Some(&json!(30)));
        assert_eq!(function.property("/MemorySize"), Some(&json!(256)));
        assert_eq!(
            function.property("/Environment/Variables/NODE_ENV"),
            Some(&json!("production"))
        );
        assert_eq!(
            function.property("/VpcConfig/SubnetIds"),
            Some(&Value::Array(network.subnet_refs(SubnetTier::PrivateWithEgress)))
        );
    }

    #[test]
    fn test_function_waits_for_egress_routes() {
        let (network, compute, template) = compute(false);
        let function = template.resource(compute.function.logical_id()).unwrap();
        assert!(!network.egress_routes.is_empty());
        for route in &network.egress_routes {
            assert!(function.depends_on.iter().any(|id| id == route.logical_id()));
        }
        assert!(function.depends_on.iter().any(|id| id == compute.role.logical_id()));
    }

    #[test]
    fn test_tracing_on_adds_xray_policy() {
        let (_, compute, template) = compute(true);
        let function = template.resource(compute.function.logical_id()).unwrap();
        assert_eq!(function.property("/TracingConfig/Mode"), Some(&json!("Active")));
        let role = template.resource(compute.role.logical_id()).unwrap();
        let policies = role.property("/ManagedPolicyArns").and_then(Value::as_array).unwrap();
        assert_eq!(policies.len(), 3);
        assert!(policies.contains(&managed_policy_arn("AWSXRayDaemonWriteAccess")));
    }

    #[test]
    fn test_tracing_off_is_pass_through() {
        let (_, compute, template) = compute(false);
        let function = template.resource(compute.function.logical_id()).unwrap();
        assert_eq!(function.property("/TracingConfig/Mode"), Some(&json!("PassThrough")));
        let role = template.resource(compute.role.logical_id()).unwrap();
        let policies = role.property("/ManagedPolicyArns").and_then(Value::as_array).unwrap();
        assert!(!policies.contains(&managed_policy_arn("AWSXRayDaemonWriteAccess")));
    }
}
