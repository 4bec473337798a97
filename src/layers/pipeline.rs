//! # Delivery Pipeline
//!
//! Source archive upload -> build -> static site deploy.
//!
//! An external uploader drops `source.zip` into the source bucket. The
//! pipeline picks it up, hands it to the build project, and extracts the
//! build output into the website bucket. Both roles are scoped to the three
//! buckets involved and to the build project's own log group.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::iam::{allow, assume_role_policy, policy_document};
use super::storage::{declare_bucket, object_read_write, AutoDeleteProvider, Bucket};
use crate::config::ResolvedConfig;
use crate::constants::PIPELINE_SOURCE_KEY;
use crate::error::StackError;
use crate::naming::{BucketRole, NameBuilder};
use crate::stack::StackBuilder;
use crate::template::intrinsic::sub;
use crate::template::{Resource, ResourceHandle};

const SOURCE_OUTPUT: &str = "SourceOutput";
const BUILD_OUTPUT: &str = "BuildOutput";

/// Build instructions executed by the build project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSpec {
    pub version: &'static str,
    pub phases: BuildPhases,
    pub artifacts: BuildArtifacts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildPhases {
    pub install: InstallPhase,
    pub pre_build: CommandPhase,
    pub build: CommandPhase,
    pub post_build: CommandPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallPhase {
    #[serde(rename = "runtime-versions")]
    pub runtime_versions: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandPhase {
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildArtifacts {
    pub files: Vec<String>,
}

fn commands(list: &[&str]) -> CommandPhase {
    CommandPhase {
        commands: list.iter().map(|c| (*c).to_string()).collect(),
    }
}

impl BuildSpec {
    /// Build spec for a Node.js project on the function's runtime
    #[must_use]
    pub fn for_config(config: &ResolvedConfig) -> Self {
        let (language, version) = config.lambda_runtime.build_runtime_version();
        Self {
            version: "0.2",
            phases: BuildPhases {
                install: InstallPhase {
                    runtime_versions: BTreeMap::from([(language, version)]),
                },
                pre_build: commands(&["npm install"]),
                build: commands(&["npm run build", "npm run test"]),
                post_build: commands(&["echo Build completed on `date`"]),
            },
            artifacts: BuildArtifacts {
                files: vec!["**/*".to_string()],
            },
        }
    }

    /// # Errors
    ///
    /// [`StackError::Render`] if YAML serialization fails.
    pub fn to_yaml(&self) -> Result<String, StackError> {
        serde_yaml::to_string(self).map_err(|e| StackError::Render(format!("build spec: {e}")))
    }
}

/// What a pipeline stage does
#[derive(Debug, Clone, PartialEq)]
pub enum StageAction {
    /// Fetch an object from a bucket
    S3Source { bucket: ResourceHandle, key: String },
    CodeBuild { project: ResourceHandle },
    /// Extract the input artifact into a bucket
    S3Deploy { bucket: ResourceHandle },
}

/// One stage with a single action and its artifact wiring
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStage {
    pub name: String,
    pub action: StageAction,
    pub input: Option<String>,
    pub output: Option<String>,
}

impl PipelineStage {
    fn to_json(&self) -> Value {
        let (action_name, category, provider, configuration) = match &self.action {
            StageAction::S3Source { bucket, key } => (
                "S3Source",
                "Source",
                "S3",
                json!({
                    "S3Bucket": bucket.reference(),
                    "S3ObjectKey": key,
                    "PollForSourceChanges": true
                }),
            ),
            StageAction::CodeBuild { project } => (
                "Build",
                "Build",
                "CodeBuild",
                json!({ "ProjectName": project.reference() }),
            ),
            StageAction::S3Deploy { bucket } => (
                "Deploy",
                "Deploy",
                "S3",
                json!({ "BucketName": bucket.reference(), "Extract": "true" }),
            ),
        };

        let mut action = json!({
            "Name": action_name,
            "ActionTypeId": {
                "Category": category,
                "Owner": "AWS",
                "Provider": provider,
                "Version": "1"
            },
            "Configuration": configuration,
            "RunOrder": 1
        });
        if let Value::Object(map) = &mut action {
            if let Some(input) = &self.input {
                map.insert("InputArtifacts".to_string(), json!([{ "Name": input }]));
            }
            if let Some(output) = &self.output {
                map.insert("OutputArtifacts".to_string(), json!([{ "Name": output }]));
            }
        }

        json!({ "Name": self.name, "Actions": [action] })
    }
}

/// Check that stages form a single chain
///
/// The first stage takes no input, every later stage consumes exactly the
/// previous stage's output, and the last stage produces nothing.
///
/// # Errors
///
/// [`StackError::InvalidPipelineWiring`] naming the offending stage.
pub fn validate_stage_wiring(stages: &[PipelineStage]) -> Result<(), StackError> {
    let (first, last) = match (stages.first(), stages.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(StackError::InvalidPipelineWiring(
                "pipeline has no stages".to_string(),
            ))
        }
    };

    if let Some(input) = &first.input {
        return Err(StackError::InvalidPipelineWiring(format!(
            "first stage '{}' must not consume an artifact, found '{input}'",
            first.name
        )));
    }

    for pair in stages.windows(2) {
        let (previous, stage) = (&pair[0], &pair[1]);
        match (&previous.output, &stage.input) {
            (Some(produced), Some(consumed)) if produced == consumed => {}
            (produced, consumed) => {
                return Err(StackError::InvalidPipelineWiring(format!(
                    "stage '{}' consumes {:?} but stage '{}' produces {:?}",
                    stage.name, consumed, previous.name, produced
                )))
            }
        }
    }

    if let Some(output) = &last.output {
        return Err(StackError::InvalidPipelineWiring(format!(
            "last stage '{}' must not produce an artifact, found '{output}'",
            last.name
        )));
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub artifacts: Bucket,
    pub source: Bucket,
    pub build_role: ResourceHandle,
    pub build_project: ResourceHandle,
    pub pipeline_role: ResourceHandle,
    pub pipeline: ResourceHandle,
    pub stages: Vec<PipelineStage>,
}

pub fn declare(
    builder: &mut StackBuilder,
    config: &ResolvedConfig,
    names: &NameBuilder,
    provider: &AutoDeleteProvider,
    website: &Bucket,
) -> Result<Pipeline, StackError> {
    info!(
        image = %config.codebuild_image,
        compute_type = %config.codebuild_compute_type,
        "declaring pipeline layer"
    );

    let artifacts = declare_bucket(
        builder,
        provider,
        "PipelineArtifacts",
        names.bucket(BucketRole::PipelineArtifacts)?,
        None,
    )?;
    let source = declare_bucket(
        builder,
        provider,
        "PipelineSource",
        names.bucket(BucketRole::PipelineSource)?,
        None,
    )?;
    let buckets = [&source.bucket, &artifacts.bucket, &website.bucket];

    let project_name = names.resource("build");
    let build_role = builder.declare(
        Resource::new("TapBuildProjectRole", "AWS::IAM::Role").properties(json!({
            "AssumeRolePolicyDocument": assume_role_policy("codebuild.amazonaws.com")
        })),
    )?;
    let build_policy = builder.declare(
        Resource::new("TapBuildProjectRolePolicy", "AWS::IAM::Policy").properties(json!({
            "PolicyName": "TapBuildProjectRolePolicy",
            "PolicyDocument": policy_document(vec![
                allow(
                    &["logs:CreateLogGroup", "logs:CreateLogStream", "logs:PutLogEvents"],
                    build_log_group_arns(&project_name),
                ),
                object_read_write(&buckets),
            ]),
            "Roles": [build_role.reference()]
        })),
    )?;

    let build_spec = BuildSpec::for_config(config).to_yaml()?;
    debug!(project = %project_name, "rendered build spec");

    let build_project = builder.declare(
        Resource::new("TapBuildProject", "AWS::CodeBuild::Project")
            .properties(json!({
                "Name": project_name,
                "ServiceRole": build_role.attr("Arn"),
                "Source": {
                    "Type": "S3",
                    "Location": sub(format!(
                        "${{{}}}/{PIPELINE_SOURCE_KEY}",
                        source.bucket.logical_id()
                    )),
                    "BuildSpec": build_spec
                },
                "Environment": {
                    "Type": "LINUX_CONTAINER",
                    "Image": config.codebuild_image.as_str(),
                    "ComputeType": config.codebuild_compute_type.as_str(),
                    "PrivilegedMode": false
                },
                "Artifacts": { "Type": "NO_ARTIFACTS" },
                "EncryptionKey": "alias/aws/s3"
            }))
            .depends_on(&build_policy),
    )?;

    let stages = vec![
        PipelineStage {
            name: "Source".to_string(),
            action: StageAction::S3Source {
                bucket: source.bucket.clone(),
                key: PIPELINE_SOURCE_KEY.to_string(),
            },
            input: None,
            output: Some(SOURCE_OUTPUT.to_string()),
        },
        PipelineStage {
            name: "Build".to_string(),
            action: StageAction::CodeBuild {
                project: build_project.clone(),
            },
            input: Some(SOURCE_OUTPUT.to_string()),
            output: Some(BUILD_OUTPUT.to_string()),
        },
        PipelineStage {
            name: "Deploy".to_string(),
            action: StageAction::S3Deploy {
                bucket: website.bucket.clone(),
            },
            input: Some(BUILD_OUTPUT.to_string()),
            output: None,
        },
    ];
    validate_stage_wiring(&stages)?;

    let pipeline_role = builder.declare(
        Resource::new("TapPipelineRole", "AWS::IAM::Role").properties(json!({
            "AssumeRolePolicyDocument": assume_role_policy("codepipeline.amazonaws.com")
        })),
    )?;
    let pipeline_policy = builder.declare(
        Resource::new("TapPipelineRolePolicy", "AWS::IAM::Policy").properties(json!({
            "PolicyName": "TapPipelineRolePolicy",
            "PolicyDocument": policy_document(vec![
                object_read_write(&buckets),
                allow(
                    &["s3:GetBucketVersioning", "s3:GetBucketLocation", "s3:ListBucket"],
                    buckets.iter().map(|b| b.attr("Arn")).collect(),
                ),
                allow(
                    &["codebuild:StartBuild", "codebuild:BatchGetBuilds", "codebuild:StopBuild"],
                    vec![build_project.attr("Arn")],
                ),
            ]),
            "Roles": [pipeline_role.reference()]
        })),
    )?;

    let pipeline = builder.declare(
        Resource::new("TapPipeline", "AWS::CodePipeline::Pipeline")
            .properties(json!({
                "Name": names.resource("pipeline"),
                "RoleArn": pipeline_role.attr("Arn"),
                "ArtifactStore": {
                    "Type": "S3",
                    "Location": artifacts.bucket.reference()
                },
                "Stages": stages.iter().map(PipelineStage::to_json).collect::<Vec<_>>()
            }))
            .depends_on(&pipeline_policy)
            .depends_on(&pipeline_role),
    )?;

    Ok(Pipeline {
        artifacts,
        source,
        build_role,
        build_project,
        pipeline_role,
        pipeline,
        stages,
    })
}

/// The build project's log group and its streams
///
/// Named from the project name rather than the project's own attributes, so
/// the policy can be declared before the project.
fn build_log_group_arns(project_name: &str) -> Vec<Value> {
    let group = format!(
        "arn:${{AWS::Partition}}:logs:${{AWS::Region}}:${{AWS::AccountId}}:log-group:/aws/codebuild/{project_name}"
    );
    vec![sub(group.clone()), sub(format!("{group}:*"))]
}
