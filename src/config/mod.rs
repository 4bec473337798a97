//! # Configuration
//!
//! Caller-supplied props, their resolution against defaults, the target
//! environment, and the synthesizer's own settings.
//!
//! ## Module Structure
//!
//! - `types.rs` - Closed value sets (runtime, engine version, sizing, build environment)
//! - `props.rs` - Partial caller configuration, loadable from YAML/JSON
//! - `resolve.rs` - Default merging into the immutable resolved configuration
//! - `environment.rs` - Target account and region
//! - `settings.rs` - Logging and output settings of the tool itself

mod environment;
mod props;
mod resolve;
mod settings;
pub mod types;

pub use environment::StackEnvironment;
pub use props::StackProps;
pub use resolve::{resolve, supports_performance_insights, ResolvedConfig};
pub use settings::{LogSettings, TemplateFormat};
