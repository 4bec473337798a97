//! # tap
//!
//! Command-line interface of the TAP stack synthesizer.
//!
//! ## Usage
//!
//! ```bash
//! # Synthesize the template for the current AWS credentials
//! tap synth > template.json
//!
//! # Synthesize a "dev" environment from a props file, as YAML
//! tap synth --props stack.yaml --env-suffix dev --format yaml --output template.yaml
//!
//! # Show the configuration a props file resolves to
//! tap config --props stack.yaml --alarms false
//!
//! # List declared resources in declaration order
//! tap resources --account 111122223333 --region us-east-1
//! ```
//!
//! Precedence for every stack setting: command-line flag (or its environment
//! variable), then the props file, then the built-in default.

mod config;
mod resources;
mod synth;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use tap_stack::aws::discover_environment;
use tap_stack::config::{LogSettings, StackEnvironment, StackProps, TemplateFormat};
use tap_stack::observability::init_logging;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
);

/// TAP stack synthesizer
#[derive(Parser, Debug)]
#[command(name = "tap")]
#[command(version = VERSION, about = "Synthesize the TAP web application stack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize the CloudFormation template
    Synth {
        #[command(flatten)]
        props: PropsArgs,

        #[command(flatten)]
        environment: EnvironmentArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the resolved stack configuration
    Config {
        #[command(flatten)]
        props: PropsArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// List declared resources (logical id and type) in declaration order
    Resources {
        #[command(flatten)]
        props: PropsArgs,

        #[command(flatten)]
        environment: EnvironmentArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Stack settings: props file plus per-field overrides
#[derive(Args, Debug, Default)]
struct PropsArgs {
    /// Props file (YAML or JSON, camelCase fields)
    #[arg(long, value_name = "FILE")]
    props: Option<PathBuf>,

    /// Environment suffix appended to every derived name
    #[arg(long, env = "TAP_ENV_SUFFIX", value_name = "SUFFIX")]
    env_suffix: Option<String>,

    /// Distributed tracing on the function and the API stage
    #[arg(long, value_name = "BOOL")]
    tracing: Option<bool>,

    /// Threshold alarms on function, API and database metrics
    #[arg(long, value_name = "BOOL")]
    alarms: Option<bool>,

    /// Database backup retention in days (0-35)
    #[arg(long, value_name = "DAYS")]
    backup_retention_days: Option<u32>,
}

impl PropsArgs {
    /// Props file layered under the command-line overrides
    fn load(&self) -> Result<StackProps> {
        let file = match &self.props {
            Some(path) => StackProps::from_file(path)
                .with_context(|| format!("Failed to load props from {}", path.display()))?,
            None => StackProps::default(),
        };
        Ok(file.merged_with(self.overrides()))
    }

    fn overrides(&self) -> StackProps {
        StackProps {
            environment_suffix: self.env_suffix.clone(),
            backup_retention_days: self.backup_retention_days,
            enable_xray_tracing: self.tracing,
            enable_cloud_watch_alarms: self.alarms,
            ..StackProps::default()
        }
    }
}

/// Target account and region; discovered from AWS when omitted
#[derive(Args, Debug, Default)]
struct EnvironmentArgs {
    /// Target account id
    #[arg(long, env = "CDK_DEFAULT_ACCOUNT", value_name = "ID")]
    account: Option<String>,

    /// Target region
    #[arg(long, env = "CDK_DEFAULT_REGION", value_name = "REGION")]
    region: Option<String>,
}

impl EnvironmentArgs {
    async fn resolve(self) -> Result<StackEnvironment> {
        discover_environment(self.account, self.region)
            .await
            .context("Failed to determine target account and region")
    }
}

#[derive(Args, Debug, Default)]
struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = TemplateFormat::Json)]
    format: TemplateFormat,

    /// Write to FILE instead of stdout
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Write `contents` to `path`, or to stdout when no path is given
fn write_output(contents: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&LogSettings::from_env())?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth {
            props,
            environment,
            output,
        } => synth::run(&props, environment, &output).await,
        Commands::Config { props, output } => config::run(&props, &output),
        Commands::Resources {
            props,
            environment,
            json,
        } => resources::run(&props, environment, json).await,
    }
}
