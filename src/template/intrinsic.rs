//! # Intrinsic Functions
//!
//! Builders for CloudFormation intrinsic functions, and the inverse: finding
//! every logical id a property tree refers to. The builder uses the latter to
//! reject references to resources that have not been declared yet.

use serde_json::{json, Value};
use std::collections::BTreeSet;

#[must_use]
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

#[must_use]
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `Fn::Sub` in string form; `${Id}` and `${Id.Attr}` count as references
#[must_use]
pub fn sub(template: impl Into<String>) -> Value {
    json!({ "Fn::Sub": template.into() })
}

#[must_use]
pub fn join(separator: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [separator, parts] })
}

#[must_use]
pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index.to_string(), list] })
}

#[must_use]
pub fn split(separator: &str, source: Value) -> Value {
    json!({ "Fn::Split": [separator, source] })
}

/// Availability zones of the stack's region
#[must_use]
pub fn get_azs() -> Value {
    json!({ "Fn::GetAZs": "" })
}

/// Logical ids referenced anywhere in `value` (pseudo parameters excluded)
#[must_use]
pub fn collect_references(value: &Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    walk(value, &mut found);
    found
}

fn walk(value: &Value, found: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(id)) = map.get("Ref") {
                    insert_logical_id(id, found);
                    return;
                }
                if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(id)) = args.first() {
                        insert_logical_id(id, found);
                    }
                    return;
                }
                if let Some(args) = map.get("Fn::Sub") {
                    walk_sub(args, found);
                    return;
                }
            }
            for nested in map.values() {
                walk(nested, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, found);
            }
        }
        _ => {}
    }
}

fn walk_sub(args: &Value, found: &mut BTreeSet<String>) {
    match args {
        Value::String(template) => {
            for name in sub_variables(template) {
                insert_logical_id(&name, found);
            }
        }
        // [template, { local: value }]: locals shadow logical ids
        Value::Array(parts) => {
            let locals: BTreeSet<&str> = parts
                .get(1)
                .and_then(Value::as_object)
                .map(|vars| vars.keys().map(String::as_str).collect())
                .unwrap_or_default();
            if let Some(Value::String(template)) = parts.first() {
                for name in sub_variables(template) {
                    if !locals.contains(name.as_str()) {
                        insert_logical_id(&name, found);
                    }
                }
            }
            if let Some(vars) = parts.get(1) {
                walk(vars, found);
            }
        }
        _ => {}
    }
}

/// Variable names in a `Fn::Sub` template: `${Name}` or `${Name.Attr}`.
/// `${!Literal}` is an escape and yields nothing.
fn sub_variables(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let var = &after[..end];
        if !var.starts_with('!') {
            let name = var.split('.').next().unwrap_or(var);
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}

fn insert_logical_id(id: &str, found: &mut BTreeSet<String>) {
    if !id.contains("::") {
        found.insert(id.to_string());
    }
}
