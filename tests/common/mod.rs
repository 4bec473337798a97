//! Common test utilities for stack synthesis tests
//!
//! Provides a fixed target environment and helpers to synthesize and query
//! templates.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use serde_json::Value;
use tap_stack::config::{StackEnvironment, StackProps};
use tap_stack::stack::{synthesize, Stack};
use tap_stack::template::Resource;

pub const ACCOUNT: &str = "111122223333";
pub const REGION: &str = "us-east-1";

pub fn environment() -> StackEnvironment {
    StackEnvironment::new(ACCOUNT, REGION)
}

/// Synthesize with the test environment, panicking on failure
pub fn synth(props: &StackProps) -> Stack {
    synthesize(props, &environment()).expect("stack synthesis should succeed")
}

pub fn resource<'a>(stack: &'a Stack, logical_id: &str) -> &'a Resource {
    stack
        .template
        .resource(logical_id)
        .unwrap_or_else(|| panic!("resource {logical_id} should be declared"))
}

pub fn count_of_type(stack: &Stack, resource_type: &str) -> usize {
    stack.template.resources_of_type(resource_type).count()
}

/// The rendered JSON template
pub fn template_json(stack: &Stack) -> Value {
    serde_json::to_value(&stack.template).expect("template should serialize")
}
