//! # Props Schema Generator
//!
//! Prints the JSON schema of the stack props file as YAML, for editor
//! completion and for validating props files in CI.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin propsgen > schema/stack-props.schema.yaml
//! ```

use anyhow::{Context, Result};
use schemars::schema_for;

use tap_stack::config::StackProps;

fn main() -> Result<()> {
    let schema = schema_for!(StackProps);
    let yaml = serde_yaml::to_string(&schema).context("Failed to serialize props schema")?;
    print!("{yaml}");
    Ok(())
}
