//! # Template Model
//!
//! The synthesized artifact: an ordered set of resource declarations plus the
//! published outputs, serializable as a CloudFormation template.
//!
//! Resources keep their declaration order when serialized, so a template
//! reads top to bottom in dependency order.

pub mod intrinsic;
mod render;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::constants::TEMPLATE_FORMAT_VERSION;

pub use render::render;

/// What happens to a resource's data when the stack is deleted or the
/// resource is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    Delete,
    Retain,
    Snapshot,
}

/// Identity of a declared resource
///
/// Handles are only produced by [`crate::stack::StackBuilder::declare`], so
/// holding one proves the resource already exists in the template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    logical_id: String,
    resource_type: String,
}

impl ResourceHandle {
    pub(crate) fn new(logical_id: &str, resource_type: &str) -> Self {
        Self {
            logical_id: logical_id.to_string(),
            resource_type: resource_type.to_string(),
        }
    }

    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// `{"Ref": id}`
    #[must_use]
    pub fn reference(&self) -> Value {
        intrinsic::reference(&self.logical_id)
    }

    /// `{"Fn::GetAtt": [id, attribute]}`
    #[must_use]
    pub fn attr(&self, attribute: &str) -> Value {
        intrinsic::get_att(&self.logical_id, attribute)
    }
}

/// One resource declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub logical_id: String,
    pub resource_type: String,
    pub properties: Value,
    pub depends_on: Vec<String>,
    pub deletion_policy: Option<DeletionPolicy>,
}

impl Resource {
    #[must_use]
    pub fn new(logical_id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            resource_type: resource_type.into(),
            properties: Value::Object(serde_json::Map::new()),
            depends_on: Vec::new(),
            deletion_policy: None,
        }
    }

    #[must_use]
    pub fn properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    /// Explicit ordering edge for dependencies not visible in the properties
    #[must_use]
    pub fn depends_on(mut self, handle: &ResourceHandle) -> Self {
        if !self.depends_on.iter().any(|id| id == handle.logical_id()) {
            self.depends_on.push(handle.logical_id().to_string());
        }
        self
    }

    /// Applies to both deletion and replacement
    #[must_use]
    pub fn deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }

    /// Property lookup by JSON pointer relative to `Properties`, e.g. `/VpcConfig/SubnetIds`
    #[must_use]
    pub fn property(&self, pointer: &str) -> Option<&Value> {
        self.properties.pointer(pointer)
    }
}

/// A published stack output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    #[serde(skip)]
    pub logical_id: String,
    pub description: String,
    pub value: Value,
}

/// A complete synthesized template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub description: String,
    pub resources: Vec<Resource>,
    pub outputs: Vec<Output>,
}

impl Template {
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.resource_type == resource_type)
    }

    #[must_use]
    pub fn output(&self, logical_id: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.logical_id == logical_id)
    }

    /// Position of a resource in declaration order
    #[must_use]
    pub fn position(&self, logical_id: &str) -> Option<usize> {
        self.resources.iter().position(|r| r.logical_id == logical_id)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResourceBody<'a> {
    #[serde(rename = "Type")]
    resource_type: &'a str,
    #[serde(skip_serializing_if = "is_empty_object")]
    properties: &'a Value,
    #[serde(skip_serializing_if = "is_empty_list")]
    depends_on: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    deletion_policy: Option<DeletionPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_replace_policy: Option<DeletionPolicy>,
}

#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde skip_serializing_if signature")]
fn is_empty_list(list: &&[String]) -> bool {
    list.is_empty()
}

#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde skip_serializing_if signature")]
fn is_empty_object(value: &&Value) -> bool {
    value.as_object().is_some_and(serde_json::Map::is_empty)
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ResourceBody {
            resource_type: &self.resource_type,
            properties: &self.properties,
            depends_on: &self.depends_on,
            deletion_policy: self.deletion_policy,
            update_replace_policy: self.deletion_policy,
        }
        .serialize(serializer)
    }
}

struct Keyed<'a, T>(&'a [T], fn(&T) -> &str);

impl<T: Serialize> Serialize for Keyed<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for item in self.0 {
            map.serialize_entry((self.1)(item), item)?;
        }
        map.end()
    }
}

fn resource_key(resource: &Resource) -> &str {
    &resource.logical_id
}

fn output_key(output: &Output) -> &str {
    &output.logical_id
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("AWSTemplateFormatVersion", TEMPLATE_FORMAT_VERSION)?;
        map.serialize_entry("Description", &self.description)?;
        map.serialize_entry("Resources", &Keyed(&self.resources, resource_key))?;
        if !self.outputs.is_empty() {
            map.serialize_entry("Outputs", &Keyed(&self.outputs, output_key))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_serialization() {
        let resource = Resource::new("WebsiteBucket", "AWS::S3::Bucket")
            .properties(json!({ "BucketName": "tap-website" }))
            .deletion_policy(DeletionPolicy::Delete);

        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({
                "Type": "AWS::S3::Bucket",
                "Properties": { "BucketName": "tap-website" },
                "DeletionPolicy": "Delete",
                "UpdateReplacePolicy": "Delete"
            })
        );
    }

    #[test]
    fn test_empty_properties_and_depends_on_are_omitted() {
        let handle = ResourceHandle::new("TapVpc", "AWS::EC2::VPC");
        let resource = Resource::new("Igw", "AWS::EC2::InternetGateway");
        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({ "Type": "AWS::EC2::InternetGateway" })
        );

        let resource = resource.depends_on(&handle).depends_on(&handle);
        assert_eq!(resource.depends_on, vec!["TapVpc".to_string()]);
    }

    #[test]
    fn test_template_keeps_declaration_order() {
        let template = Template {
            description: "test".to_string(),
            resources: vec![
                Resource::new("Zeta", "AWS::SNS::Topic"),
                Resource::new("Alpha", "AWS::SNS::Topic"),
            ],
            outputs: vec![],
        };
        let rendered = serde_json::to_string(&template).unwrap();
        let zeta = rendered.find("Zeta").unwrap();
        let alpha = rendered.find("Alpha").unwrap();
        assert!(zeta < alpha);
        assert!(!rendered.contains("Outputs"));
        assert!(rendered.starts_with("{\"AWSTemplateFormatVersion\":\"2010-09-09\""));
    }
}
