//! # Stack Builder
//!
//! Accumulates resource declarations in dependency order.
//!
//! Every declaration is checked against what has been declared so far: a
//! reference (`Ref`, `Fn::GetAtt`, `Fn::Sub` variable or `DependsOn`) to a
//! logical id that does not exist yet is rejected, as is a second declaration
//! of the same logical id. The finished template is therefore topologically
//! ordered by construction.

use std::collections::HashSet;
use tracing::debug;

use crate::constants::TEMPLATE_DESCRIPTION;
use crate::error::StackError;
use crate::template::intrinsic::collect_references;
use crate::template::{Output, Resource, ResourceHandle, Template};

#[derive(Debug)]
pub struct StackBuilder {
    description: String,
    declared: HashSet<String>,
    resources: Vec<Resource>,
    outputs: Vec<Output>,
}

impl Default for StackBuilder {
    fn default() -> Self {
        Self::new(TEMPLATE_DESCRIPTION)
    }
}

impl StackBuilder {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            declared: HashSet::new(),
            resources: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declare a resource and return its handle
    ///
    /// # Errors
    ///
    /// [`StackError::DuplicateLogicalId`] if the id is taken,
    /// [`StackError::UndeclaredReference`] if the resource refers to an id
    /// that has not been declared before it.
    pub fn declare(&mut self, resource: Resource) -> Result<ResourceHandle, StackError> {
        if self.declared.contains(&resource.logical_id) {
            return Err(StackError::DuplicateLogicalId(resource.logical_id));
        }

        let referenced = collect_references(&resource.properties)
            .into_iter()
            .chain(resource.depends_on.iter().cloned());
        for target in referenced {
            if !self.declared.contains(&target) {
                return Err(StackError::UndeclaredReference {
                    from: resource.logical_id,
                    to: target,
                });
            }
        }

        debug!(
            logical_id = %resource.logical_id,
            resource_type = %resource.resource_type,
            "declared resource"
        );

        let handle = ResourceHandle::new(&resource.logical_id, &resource.resource_type);
        self.declared.insert(resource.logical_id.clone());
        self.resources.push(resource);
        Ok(handle)
    }

    /// Run `declare` only when `guard` holds
    ///
    /// Each optional resource group evaluates its feature flag here, once.
    pub fn declare_if<T>(
        &mut self,
        guard: bool,
        declare: impl FnOnce(&mut Self) -> Result<T, StackError>,
    ) -> Result<Option<T>, StackError> {
        if guard {
            declare(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Publish an output
    ///
    /// Outputs are built from handles, which only exist for declared
    /// resources, so publishing cannot fail.
    pub fn output(&mut self, logical_id: &str, description: &str, value: serde_json::Value) {
        debug_assert!(
            collect_references(&value)
                .iter()
                .all(|id| self.declared.contains(id)),
            "output {logical_id} references an undeclared resource"
        );
        self.outputs.push(Output {
            logical_id: logical_id.to_string(),
            description: description.to_string(),
            value,
        });
    }

    /// Number of resources declared so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    #[must_use]
    pub fn finish(self) -> Template {
        Template {
            description: self.description,
            resources: self.resources,
            outputs: self.outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::intrinsic;
    use serde_json::json;

    #[test]
    fn test_declare_returns_handle() {
        let mut builder = StackBuilder::default();
        let vpc = builder
            .declare(Resource::new("TapVpc", "AWS::EC2::VPC"))
            .unwrap();
        assert_eq!(vpc.logical_id(), "TapVpc");
        assert_eq!(vpc.resource_type(), "AWS::EC2::VPC");
        assert_eq!(vpc.reference(), json!({ "Ref": "TapVpc" }));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let mut builder = StackBuilder::default();
        let err = builder
            .declare(
                Resource::new("Subnet", "AWS::EC2::Subnet")
                    .properties(json!({ "VpcId": intrinsic::reference("TapVpc") })),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StackError::UndeclaredReference { ref from, ref to } if from == "Subnet" && to == "TapVpc"
        ));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_reference_after_declaration_is_accepted() {
        let mut builder = StackBuilder::default();
        let vpc = builder.declare(Resource::new("TapVpc", "AWS::EC2::VPC")).unwrap();
        builder
            .declare(
                Resource::new("Subnet", "AWS::EC2::Subnet")
                    .properties(json!({ "VpcId": vpc.reference() })),
            )
            .unwrap();
        assert_eq!(builder.finish().position("Subnet"), Some(1));
    }

    #[test]
    fn test_pseudo_parameters_need_no_declaration() {
        let mut builder = StackBuilder::default();
        builder
            .declare(
                Resource::new("Topic", "AWS::SNS::Topic")
                    .properties(json!({ "TopicName": intrinsic::sub("${AWS::StackName}-topic") })),
            )
            .unwrap();
    }

    #[test]
    fn test_duplicate_logical_id_is_rejected() {
        let mut builder = StackBuilder::default();
        builder.declare(Resource::new("Bucket", "AWS::S3::Bucket")).unwrap();
        let err = builder
            .declare(Resource::new("Bucket", "AWS::S3::Bucket"))
            .unwrap_err();
        assert!(matches!(err, StackError::DuplicateLogicalId(id) if id == "Bucket"));
    }

    #[test]
    fn test_declare_if_skips_when_guard_is_false() {
        let mut builder = StackBuilder::default();
        let skipped = builder
            .declare_if(false, |b| b.declare(Resource::new("Alarm", "AWS::CloudWatch::Alarm")))
            .unwrap();
        assert!(skipped.is_none());
        assert!(builder.is_empty());

        let declared = builder
            .declare_if(true, |b| b.declare(Resource::new("Alarm", "AWS::CloudWatch::Alarm")))
            .unwrap();
        assert!(declared.is_some());
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_outputs_are_kept_in_order() {
        let mut builder = StackBuilder::default();
        let bucket = builder.declare(Resource::new("Bucket", "AWS::S3::Bucket")).unwrap();
        builder.output("First", "first", bucket.reference());
        builder.output("Second", "second", bucket.attr("Arn"));
        let template = builder.finish();
        let ids: Vec<_> = template.outputs.iter().map(|o| o.logical_id.as_str()).collect();
        assert_eq!(ids, vec!["First", "Second"]);
    }
}
