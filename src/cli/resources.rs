//! `tap resources`

use anyhow::{Context, Result};

use super::{write_output, EnvironmentArgs, PropsArgs};
use tap_stack::stack::{synthesize, ResourceSummary};

pub async fn run(props: &PropsArgs, environment: EnvironmentArgs, json: bool) -> Result<()> {
    let stack_props = props.load()?;
    let environment = environment.resolve().await?;
    let stack = synthesize(&stack_props, &environment).context("Stack synthesis failed")?;
    let summaries = stack.resource_summaries();

    let rendered = if json {
        serde_json::to_string_pretty(&summaries)
            .map(|json| json + "\n")
            .context("Failed to serialize resource list")?
    } else {
        table(&summaries)
    };
    write_output(&rendered, None)
}

/// Two columns, padded to the longest logical id
fn table(summaries: &[ResourceSummary]) -> String {
    let width = summaries.iter().map(|s| s.logical_id.len()).max().unwrap_or(0);
    summaries
        .iter()
        .map(|s| format!("{:width$}  {}\n", s.logical_id, s.resource_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_aligns_types() {
        let rows = [
            ResourceSummary {
                logical_id: "TapVpc".to_string(),
                resource_type: "AWS::EC2::VPC".to_string(),
            },
            ResourceSummary {
                logical_id: "ApiLambda".to_string(),
                resource_type: "AWS::Lambda::Function".to_string(),
            },
        ];
        assert_eq!(
            table(&rows),
            "TapVpc     AWS::EC2::VPC\nApiLambda  AWS::Lambda::Function\n"
        );
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(table(&[]), "");
    }
}
