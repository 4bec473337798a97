//! # Stack Synthesis Tests
//!
//! End-to-end tests over complete templates.
//!
//! These tests verify:
//! - Feature flags (alarms, tracing) and their explicit `false`
//! - Isolation of the database (ingress source, subnet tier, routes)
//! - Pipeline wiring and least-privilege build permissions
//! - Naming with and without an environment suffix
//! - Outputs and declaration order

mod common;

use common::{count_of_type, resource, synth, template_json};
use serde_json::{json, Value};
use std::collections::HashSet;
use tap_stack::config::types::{InstanceClass, InstanceSize};
use tap_stack::config::{StackProps, TemplateFormat};
use tap_stack::template::intrinsic::collect_references;
use tap_stack::template::{render, DeletionPolicy};

#[test]
fn test_alarms_disabled_declares_none() {
    let stack = synth(&StackProps {
        enable_cloud_watch_alarms: Some(false),
        ..StackProps::default()
    });
    assert_eq!(count_of_type(&stack, "AWS::CloudWatch::Alarm"), 0);
}

#[test]
fn test_alarms_enabled_declares_six_with_literal_thresholds() {
    let stack = synth(&StackProps {
        environment_suffix: Some("dev".to_string()),
        ..StackProps::default()
    });
    let alarms: Vec<_> = stack
        .template
        .resources_of_type("AWS::CloudWatch::Alarm")
        .map(|a| {
            (
                a.property("/AlarmName").cloned().unwrap(),
                a.property("/Threshold").cloned().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        alarms,
        vec![
            (json!("tap-dev-lambda-errors"), json!(5)),
            (json!("tap-dev-lambda-duration"), json!(10000)),
            (json!("tap-dev-api-4xx-errors"), json!(10)),
            (json!("tap-dev-api-5xx-errors"), json!(5)),
            (json!("tap-dev-db-cpu-utilization"), json!(80)),
            (json!("tap-dev-db-connections"), json!(80)),
        ]
    );
    for alarm in stack.template.resources_of_type("AWS::CloudWatch::Alarm") {
        assert_eq!(alarm.property("/Period"), Some(&json!(300)));
        assert_eq!(alarm.property("/EvaluationPeriods"), Some(&json!(2)));
        assert_eq!(
            alarm.property("/ComparisonOperator"),
            Some(&json!("GreaterThanThreshold"))
        );
        assert!(alarm.property("/AlarmActions").is_none());
    }
}

#[test]
fn test_tracing_false_survives_into_template() {
    let stack = synth(&StackProps {
        enable_xray_tracing: Some(false),
        ..StackProps::default()
    });
    let function = resource(&stack, "ApiLambda");
    assert_eq!(function.property("/TracingConfig/Mode"), Some(&json!("PassThrough")));
    let stage = resource(&stack, "TapApiDeploymentStageprod");
    assert_eq!(stage.property("/TracingEnabled"), Some(&json!(false)));
}

#[test]
fn test_database_ingress_is_only_the_function_security_group() {
    let stack = synth(&StackProps::default());
    let ingress: Vec<_> = stack
        .template
        .resources_of_type("AWS::EC2::SecurityGroupIngress")
        .collect();
    assert_eq!(ingress.len(), 1);
    assert_eq!(
        ingress[0].property("/SourceSecurityGroupId"),
        Some(&json!({ "Fn::GetAtt": ["ApiLambdaSecurityGroup", "GroupId"] }))
    );

    let database_group = resource(&stack, "DatabaseSecurityGroup");
    assert!(database_group.property("/SecurityGroupIngress").is_none());
}

#[test]
fn test_database_lives_in_isolated_subnets_without_routes() {
    let stack = synth(&StackProps::default());
    let subnet_group = resource(&stack, "DatabaseSubnetGroup");
    assert_eq!(
        subnet_group.property("/SubnetIds"),
        Some(&json!([
            { "Ref": "TapVpcDatabaseSubnet1" },
            { "Ref": "TapVpcDatabaseSubnet2" }
        ]))
    );

    let isolated_tables = [
        json!({ "Ref": "TapVpcDatabaseSubnet1RouteTable" }),
        json!({ "Ref": "TapVpcDatabaseSubnet2RouteTable" }),
    ];
    for route in stack.template.resources_of_type("AWS::EC2::Route") {
        let table = route.property("/RouteTableId").unwrap();
        assert!(!isolated_tables.contains(table), "{}", route.logical_id);
    }
}

#[test]
fn test_subnet_cidrs_are_disjoint() {
    let stack = synth(&StackProps::default());
    let cidrs: Vec<_> = stack
        .template
        .resources_of_type("AWS::EC2::Subnet")
        .filter_map(|s| s.property("/CidrBlock").and_then(Value::as_str))
        .collect();
    assert_eq!(cidrs.len(), 6);
    let unique: HashSet<_> = cidrs.iter().collect();
    assert_eq!(unique.len(), 6);
}

#[test]
fn test_performance_insights_boundary() {
    let cases = [
        (InstanceClass::T3, InstanceSize::Micro, false),
        (InstanceClass::T3, InstanceSize::Small, true),
        (InstanceClass::T4g, InstanceSize::Micro, true),
        (InstanceClass::R5, InstanceSize::Large, true),
    ];
    for (class, size, expected) in cases {
        let stack = synth(&StackProps {
            rds_instance_class: Some(class),
            rds_instance_size: Some(size),
            ..StackProps::default()
        });
        let database = resource(&stack, "TapDatabase");
        assert_eq!(
            database.property("/EnablePerformanceInsights"),
            Some(&json!(expected)),
            "{class}.{size}"
        );
        assert_eq!(
            database.property("/DBInstanceClass"),
            Some(&json!(format!("db.{class}.{size}")))
        );
    }
}

#[test]
fn test_bucket_names_with_and_without_suffix() {
    let plain = synth(&StackProps::default());
    assert_eq!(
        resource(&plain, "WebsiteBucket").property("/BucketName"),
        Some(&json!("tap-website-111122223333-us-east-1"))
    );

    let suffixed = synth(&StackProps {
        environment_suffix: Some("dev".to_string()),
        ..StackProps::default()
    });
    assert_eq!(
        resource(&suffixed, "WebsiteBucket").property("/BucketName"),
        Some(&json!("tap-website-111122223333-us-east-1-dev"))
    );
    assert_eq!(
        resource(&suffixed, "PipelineArtifacts").property("/BucketName"),
        Some(&json!("tap-pipeline-artifacts-111122223333-us-east-1-dev"))
    );
    assert_eq!(
        resource(&suffixed, "PipelineSource").property("/BucketName"),
        Some(&json!("tap-pipeline-source-111122223333-us-east-1-dev"))
    );
}

#[test]
fn test_every_bucket_is_removable() {
    let stack = synth(&StackProps::default());
    let buckets: Vec<_> = stack.template.resources_of_type("AWS::S3::Bucket").collect();
    assert_eq!(buckets.len(), 3);
    for bucket in buckets {
        assert_eq!(bucket.deletion_policy, Some(DeletionPolicy::Delete));
        assert!(stack
            .template
            .resources_of_type("Custom::S3AutoDeleteObjects")
            .any(|c| c.property("/BucketName") == Some(&json!({ "Ref": bucket.logical_id }))));
    }
}

#[test]
fn test_pipeline_wiring() {
    let stack = synth(&StackProps::default());
    let pipeline = resource(&stack, "TapPipeline");
    let stages = pipeline.property("/Stages").and_then(Value::as_array).unwrap();

    let names: Vec<_> = stages.iter().map(|s| s["Name"].clone()).collect();
    assert_eq!(names, vec![json!("Source"), json!("Build"), json!("Deploy")]);

    let source = &stages[0]["Actions"][0];
    assert_eq!(source["ActionTypeId"]["Provider"], json!("S3"));
    assert_eq!(source["Configuration"]["S3ObjectKey"], json!("source.zip"));
    assert!(source.get("InputArtifacts").is_none());

    let build = &stages[1]["Actions"][0];
    assert_eq!(build["ActionTypeId"]["Provider"], json!("CodeBuild"));
    assert_eq!(build["InputArtifacts"], source["OutputArtifacts"]);

    let deploy = &stages[2]["Actions"][0];
    assert_eq!(deploy["Configuration"]["BucketName"], json!({ "Ref": "WebsiteBucket" }));
    assert_eq!(deploy["Configuration"]["Extract"], json!("true"));
    assert_eq!(deploy["InputArtifacts"], build["OutputArtifacts"]);
    assert!(deploy.get("OutputArtifacts").is_none());
}

#[test]
fn test_build_policy_is_scoped_to_the_three_buckets() {
    let stack = synth(&StackProps::default());
    let policy = resource(&stack, "TapBuildProjectRolePolicy");
    let statements = policy
        .property("/PolicyDocument/Statement")
        .and_then(Value::as_array)
        .unwrap();

    let object_statement = statements
        .iter()
        .find(|s| s["Action"] == json!(["s3:GetObject", "s3:PutObject", "s3:GetObjectVersion"]))
        .unwrap();
    let scoped: HashSet<_> = collect_references(&object_statement["Resource"])
        .into_iter()
        .collect();
    assert_eq!(
        scoped,
        HashSet::from([
            "PipelineSource".to_string(),
            "PipelineArtifacts".to_string(),
            "WebsiteBucket".to_string()
        ])
    );

    for statement in statements {
        for resource in statement["Resource"].as_array().unwrap() {
            assert_ne!(resource, &json!("*"));
        }
    }
}

#[test]
fn test_cors_preflight_on_both_paths() {
    let stack = synth(&StackProps::default());
    let preflights: Vec<_> = stack
        .template
        .resources_of_type("AWS::ApiGateway::Method")
        .filter(|m| m.property("/HttpMethod") == Some(&json!("OPTIONS")))
        .collect();
    assert_eq!(preflights.len(), 2);
    for preflight in preflights {
        assert_eq!(
            preflight.property(
                "/Integration/IntegrationResponses/0/ResponseParameters/method.response.header.Access-Control-Allow-Origin"
            ),
            Some(&json!("'*'"))
        );
    }
}

#[test]
fn test_exactly_four_outputs() {
    let stack = synth(&StackProps::default());
    let ids: Vec<_> = stack
        .template
        .outputs
        .iter()
        .map(|o| o.logical_id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec!["WebsiteURL", "ApiURL", "DatabaseEndpoint", "PipelineSourceBucket"]
    );
    assert_eq!(
        stack.template.output("DatabaseEndpoint").unwrap().value,
        json!({ "Fn::GetAtt": ["TapDatabase", "Endpoint.Address"] })
    );
}

#[test]
fn test_every_reference_points_backwards() {
    let stack = synth(&StackProps::default());
    for (index, resource) in stack.template.resources.iter().enumerate() {
        for target in collect_references(&resource.properties)
            .into_iter()
            .chain(resource.depends_on.iter().cloned())
        {
            let position = stack.template.position(&target).unwrap();
            assert!(position < index, "{} -> {target}", resource.logical_id);
        }
    }
}

#[test]
fn test_nat_gateway_is_ordered_after_internet_attachment() {
    let stack = synth(&StackProps::default());
    let value = template_json(&stack);
    let resources = &value["Resources"];
    for (logical_id, body) in resources.as_object().unwrap() {
        let resource_type = body["Type"].as_str().unwrap();
        if resource_type != "AWS::EC2::NatGateway" && resource_type != "AWS::EC2::EIP" {
            continue;
        }
        let routes: Vec<_> = body["DependsOn"]
            .as_array()
            .unwrap_or_else(|| panic!("{logical_id} has no DependsOn"))
            .iter()
            .filter_map(Value::as_str)
            .filter(|id| id.ends_with("DefaultRoute"))
            .collect();
        assert!(!routes.is_empty(), "{logical_id} does not wait for a default route");
        for route in routes {
            assert_eq!(resources[route]["DependsOn"], json!(["TapVpcVPCGW"]));
        }
    }
    assert_eq!(count_of_type(&stack, "AWS::EC2::NatGateway"), 1);
}

#[test]
fn test_function_is_ordered_after_private_routes() {
    let stack = synth(&StackProps::default());
    let function = resource(&stack, "ApiLambda");
    for subnet in ["TapVpcPrivateSubnet1", "TapVpcPrivateSubnet2"] {
        let route = format!("{subnet}DefaultRoute");
        assert!(function.depends_on.contains(&route), "ApiLambda misses {route}");
    }
}

#[test]
fn test_rendered_template_shape() {
    let stack = synth(&StackProps::default());
    let value = template_json(&stack);
    assert_eq!(value["AWSTemplateFormatVersion"], json!("2010-09-09"));
    assert_eq!(value["Resources"]["TapVpc"]["Type"], json!("AWS::EC2::VPC"));
    assert_eq!(value["Outputs"]["ApiURL"]["Description"], json!("API Gateway URL"));

    let yaml = render(&stack.template, TemplateFormat::Yaml).unwrap();
    let reparsed: Value = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(reparsed, value);
}

#[test]
fn test_synthesis_is_deterministic() {
    let props = StackProps {
        environment_suffix: Some("qa".to_string()),
        ..StackProps::default()
    };
    let first = render(&synth(&props).template, TemplateFormat::Json).unwrap();
    let second = render(&synth(&props).template, TemplateFormat::Json).unwrap();
    assert_eq!(first, second);
}
