//! `tap config`

use anyhow::{Context, Result};

use super::{write_output, OutputArgs, PropsArgs};
use tap_stack::config::{resolve, TemplateFormat};

pub fn run(props: &PropsArgs, output: &OutputArgs) -> Result<()> {
    let config = resolve(&props.load()?);

    let rendered = match output.format {
        TemplateFormat::Json => serde_json::to_string_pretty(&config)
            .map(|json| json + "\n")
            .context("Failed to serialize configuration")?,
        TemplateFormat::Yaml => {
            serde_yaml::to_string(&config).context("Failed to serialize configuration")?
        }
    };
    write_output(&rendered, output.output.as_deref())
}
