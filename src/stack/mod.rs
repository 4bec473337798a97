//! # Stack
//!
//! Synthesis of the complete application stack.
//!
//! [`synthesize`] validates the target, resolves the props, and runs every
//! layer in dependency order into one [`StackBuilder`]. It either returns the
//! whole template or an error; nothing partial is ever produced.
//!
//! ## Layer order
//!
//! 1. Network
//! 2. Auto-delete provider, then the website bucket and distribution
//! 3. Compute function, then the API in front of it
//! 4. Database (needs the function's security group and role)
//! 5. Pipeline (needs the website bucket as its deploy target)
//! 6. Alarms (optional)
//! 7. Outputs

mod builder;

pub use builder::StackBuilder;

use serde::Serialize;
use tracing::info;

use crate::config::{resolve, ResolvedConfig, StackEnvironment, StackProps};
use crate::error::StackError;
use crate::layers::alarms::AlarmTargets;
use crate::layers::storage::AutoDeleteProvider;
use crate::layers::{alarms, api, compute, database, edge, network, outputs, pipeline};
use crate::template::Template;
use crate::validation::{validate_config, validate_environment};

/// A synthesized stack
#[derive(Debug, Clone)]
pub struct Stack {
    /// `tap` or `tap-{suffix}`
    pub name: String,
    pub environment: StackEnvironment,
    pub config: ResolvedConfig,
    pub template: Template,
}

/// One row of the resource listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub logical_id: String,
    pub resource_type: String,
}

impl Stack {
    /// Declared resources in declaration order
    #[must_use]
    pub fn resource_summaries(&self) -> Vec<ResourceSummary> {
        self.template
            .resources
            .iter()
            .map(|r| ResourceSummary {
                logical_id: r.logical_id.clone(),
                resource_type: r.resource_type.clone(),
            })
            .collect()
    }
}

/// Synthesize the stack for `props` in `environment`
///
/// # Errors
///
/// Any validation failure or declaration error aborts synthesis.
pub fn synthesize(props: &StackProps, environment: &StackEnvironment) -> Result<Stack, StackError> {
    validate_environment(environment)?;
    let config = resolve(props);
    validate_config(&config, environment)?;

    let names = environment.names(&config.environment_suffix);
    let prefix = names.stack_prefix();
    info!(
        stack = %prefix,
        account = %environment.account,
        region = %environment.region,
        "synthesizing stack"
    );

    let mut builder = StackBuilder::default();

    let network = network::declare(&mut builder, &prefix)?;
    let provider = AutoDeleteProvider::declare(&mut builder)?;
    let edge = edge::declare(&mut builder, &names, &provider)?;
    let compute = compute::declare(&mut builder, &config, &network)?;
    let api = api::declare(&mut builder, &config, &prefix, &compute)?;
    let database = database::declare(&mut builder, &config, &network, &compute)?;
    let pipeline = pipeline::declare(&mut builder, &config, &names, &provider, &edge.website)?;
    alarms::declare(
        &mut builder,
        config.enable_cloud_watch_alarms,
        &prefix,
        AlarmTargets {
            compute: &compute,
            api: &api,
            database: &database,
        },
    )?;
    outputs::publish(&mut builder, &edge, &api, &database, &pipeline);

    let template = builder.finish();
    info!(
        stack = %prefix,
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        "stack synthesized"
    );

    Ok(Stack {
        name: prefix,
        environment: environment.clone(),
        config,
        template,
    })
}
