//! # API Layer
//!
//! REST API fronting the compute function.
//!
//! Two routes, `/` and `/health`, each with a `GET` proxied to the function
//! and an `OPTIONS` preflight answered by a mock integration. The single
//! deployment is published as the `prod` stage with execution logging,
//! metrics and access logging. Execution logging needs the account-level
//! CloudWatch role, so the stage waits on that setting.

use serde_json::{json, Value};
use tracing::{debug, info};

use super::compute::Compute;
use super::iam::{assume_role_policy, managed_policy_arn};
use crate::config::ResolvedConfig;
use crate::constants::{
    API_ACCESS_LOG_RETENTION_DAYS, API_STAGE_NAME, CORS_ALLOWED_HEADERS, CORS_ALLOWED_METHODS,
};
use crate::error::StackError;
use crate::stack::StackBuilder;
use crate::template::intrinsic::sub;
use crate::template::{Resource, ResourceHandle};

const API_ID: &str = "TapApi";

/// One API path and its methods
#[derive(Debug, Clone)]
pub struct Route {
    /// Request path, `/` or `/health`
    pub path: String,
    pub get: ResourceHandle,
    pub preflight: ResourceHandle,
    pub permission: ResourceHandle,
}

#[derive(Debug, Clone)]
pub struct Api {
    /// `{prefix}-api`, also the `ApiName` metric dimension
    pub name: String,
    pub rest_api: ResourceHandle,
    pub account: ResourceHandle,
    pub routes: Vec<Route>,
    pub deployment: ResourceHandle,
    pub access_logs: ResourceHandle,
    pub stage: ResourceHandle,
}

impl Api {
    /// Invoke URL of the `prod` stage
    #[must_use]
    pub fn url(&self) -> Value {
        sub(format!(
            "https://${{{}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}/${{{}}}/",
            self.rest_api.logical_id(),
            self.stage.logical_id()
        ))
    }
}

pub fn declare(
    builder: &mut StackBuilder,
    config: &ResolvedConfig,
    prefix: &str,
    compute: &Compute,
) -> Result<Api, StackError> {
    info!(stage = API_STAGE_NAME, "declaring api layer");

    let name = format!("{prefix}-api");
    let rest_api = builder.declare(
        Resource::new(API_ID, "AWS::ApiGateway::RestApi").properties(json!({
            "Name": name,
            "Description": "TAP API Gateway",
            "EndpointConfiguration": { "Types": ["REGIONAL"] }
        })),
    )?;

    let cloud_watch_role = builder.declare(
        Resource::new(format!("{API_ID}CloudWatchRole"), "AWS::IAM::Role").properties(json!({
            "AssumeRolePolicyDocument": assume_role_policy("apigateway.amazonaws.com"),
            "ManagedPolicyArns": [
                managed_policy_arn("service-role/AmazonAPIGatewayPushToCloudWatchLogs")
            ]
        })),
    )?;

    let account = builder.declare(
        Resource::new(format!("{API_ID}Account"), "AWS::ApiGateway::Account")
            .properties(json!({ "CloudWatchRoleArn": cloud_watch_role.attr("Arn") }))
            .depends_on(&rest_api),
    )?;

    let health = builder.declare(
        Resource::new(format!("{API_ID}Health"), "AWS::ApiGateway::Resource").properties(json!({
            "ParentId": rest_api.attr("RootResourceId"),
            "PathPart": "health",
            "RestApiId": rest_api.reference()
        })),
    )?;

    let routes = vec![
        declare_route(builder, &rest_api, compute, "Root", "/", rest_api.attr("RootResourceId"))?,
        declare_route(builder, &rest_api, compute, "Health", "/health", health.reference())?,
    ];

    let mut deployment =
        Resource::new(format!("{API_ID}Deployment"), "AWS::ApiGateway::Deployment").properties(
            json!({
                "RestApiId": rest_api.reference(),
                "Description": "TAP API deployment"
            }),
        );
    for route in &routes {
        deployment = deployment.depends_on(&route.get).depends_on(&route.preflight);
    }
    let deployment = builder.declare(deployment)?;

    let access_logs = builder.declare(
        Resource::new(format!("{API_ID}AccessLogs"), "AWS::Logs::LogGroup").properties(json!({
            "LogGroupName": format!("/aws/apigateway/{prefix}-api-access"),
            "RetentionInDays": API_ACCESS_LOG_RETENTION_DAYS
        })),
    )?;

    let stage = builder.declare(
        Resource::new(format!("{API_ID}DeploymentStage{API_STAGE_NAME}"), "AWS::ApiGateway::Stage")
            .properties(json!({
                "RestApiId": rest_api.reference(),
                "DeploymentId": deployment.reference(),
                "StageName": API_STAGE_NAME,
                "TracingEnabled": config.enable_xray_tracing,
                "MethodSettings": [{
                    "HttpMethod": "*",
                    "ResourcePath": "/*",
                    "LoggingLevel": "INFO",
                    "DataTraceEnabled": config.enable_xray_tracing,
                    "MetricsEnabled": true
                }],
                "AccessLogSetting": {
                    "DestinationArn": access_logs.attr("Arn"),
                    "Format": access_log_format()
                }
            }))
            .depends_on(&account),
    )?;

    Ok(Api {
        name,
        rest_api,
        account,
        routes,
        deployment,
        access_logs,
        stage,
    })
}

fn declare_route(
    builder: &mut StackBuilder,
    rest_api: &ResourceHandle,
    compute: &Compute,
    name: &str,
    path: &str,
    resource_id: Value,
) -> Result<Route, StackError> {
    debug!(path, "declaring route");

    let get = builder.declare(
        Resource::new(format!("{API_ID}{name}Get"), "AWS::ApiGateway::Method").properties(json!({
            "RestApiId": rest_api.reference(),
            "ResourceId": resource_id,
            "HttpMethod": "GET",
            "AuthorizationType": "NONE",
            "Integration": {
                "Type": "AWS_PROXY",
                "IntegrationHttpMethod": "POST",
                "Uri": lambda_integration_uri(&compute.function)
            }
        })),
    )?;

    let preflight = builder.declare(
        Resource::new(format!("{API_ID}{name}Options"), "AWS::ApiGateway::Method").properties(
            json!({
                "RestApiId": rest_api.reference(),
                "ResourceId": resource_id,
                "HttpMethod": "OPTIONS",
                "AuthorizationType": "NONE",
                "Integration": {
                    "Type": "MOCK",
                    "RequestTemplates": { "application/json": "{ statusCode: 200 }" },
                    "IntegrationResponses": [{
                        "StatusCode": "204",
                        "ResponseParameters": cors_response_headers()
                    }]
                },
                "MethodResponses": [{
                    "StatusCode": "204",
                    "ResponseParameters": {
                        "method.response.header.Access-Control-Allow-Headers": true,
                        "method.response.header.Access-Control-Allow-Origin": true,
                        "method.response.header.Access-Control-Allow-Methods": true
                    }
                }]
            }),
        ),
    )?;

    let permission = builder.declare(
        Resource::new(format!("{API_ID}{name}GetPermission"), "AWS::Lambda::Permission")
            .properties(json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": compute.function.attr("Arn"),
                "Principal": "apigateway.amazonaws.com",
                "SourceArn": sub(format!(
                    "arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{}}}/*/GET{}",
                    rest_api.logical_id(),
                    path
                ))
            })),
    )?;

    Ok(Route {
        path: path.to_string(),
        get,
        preflight,
        permission,
    })
}

fn lambda_integration_uri(function: &ResourceHandle) -> Value {
    sub(format!(
        "arn:${{AWS::Partition}}:apigateway:${{AWS::Region}}:lambda:path/2015-03-31/functions/${{{}.Arn}}/invocations",
        function.logical_id()
    ))
}

/// Static header values, quoted the way mock integrations expect
fn cors_response_headers() -> Value {
    json!({
        "method.response.header.Access-Control-Allow-Headers":
            format!("'{}'", CORS_ALLOWED_HEADERS.join(",")),
        "method.response.header.Access-Control-Allow-Origin": "'*'",
        "method.response.header.Access-Control-Allow-Methods":
            format!("'{}'", CORS_ALLOWED_METHODS.join(","))
    })
}

fn access_log_format() -> String {
    json!({
        "requestId": "$context.requestId",
        "ip": "$context.identity.sourceIp",
        "requestTime": "$context.requestTime",
        "httpMethod": "$context.httpMethod",
        "resourcePath": "$context.resourcePath",
        "status": "$context.status",
        "protocol": "$context.protocol",
        "responseLength": "$context.responseLength"
    })
    .to_string()
}
