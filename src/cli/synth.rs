//! `tap synth`

use anyhow::{Context, Result};
use tracing::info;

use super::{write_output, EnvironmentArgs, OutputArgs, PropsArgs};
use tap_stack::stack::synthesize;
use tap_stack::template::render;

pub async fn run(props: &PropsArgs, environment: EnvironmentArgs, output: &OutputArgs) -> Result<()> {
    let stack_props = props.load()?;
    let environment = environment.resolve().await?;

    let stack = synthesize(&stack_props, &environment).context("Stack synthesis failed")?;
    let rendered = render(&stack.template, output.format).context("Failed to render template")?;
    write_output(&rendered, output.output.as_deref())?;

    info!(
        stack = %stack.name,
        resources = stack.template.resources.len(),
        format = ?output.format,
        "template written"
    );
    Ok(())
}
