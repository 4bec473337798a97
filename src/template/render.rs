//! Template rendering to JSON or YAML.

use super::Template;
use crate::config::TemplateFormat;
use crate::error::StackError;

/// Render a template in the requested format
pub fn render(template: &Template, format: TemplateFormat) -> Result<String, StackError> {
    match format {
        TemplateFormat::Json => serde_json::to_string_pretty(template)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| StackError::Render(e.to_string())),
        TemplateFormat::Yaml => {
            serde_yaml::to_string(template).map_err(|e| StackError::Render(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Output, Resource};
    use serde_json::json;

    fn sample() -> Template {
        Template {
            description: "sample".to_string(),
            resources: vec![Resource::new("SourceBucket", "AWS::S3::Bucket")],
            outputs: vec![Output {
                logical_id: "SourceBucketName".to_string(),
                description: "Bucket".to_string(),
                value: json!({ "Ref": "SourceBucket" }),
            }],
        }
    }

    #[test]
    fn test_render_json() {
        let rendered = render(&sample(), TemplateFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["Resources"]["SourceBucket"]["Type"], "AWS::S3::Bucket");
        assert_eq!(parsed["Outputs"]["SourceBucketName"]["Value"]["Ref"], "SourceBucket");
    }

    #[test]
    fn test_render_yaml() {
        let rendered = render(&sample(), TemplateFormat::Yaml).unwrap();
        assert!(rendered.contains("AWSTemplateFormatVersion: 2010-09-09")
            || rendered.contains("AWSTemplateFormatVersion: '2010-09-09'"));
        let parsed: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(
            parsed["Resources"]["SourceBucket"]["Type"].as_str(),
            Some("AWS::S3::Bucket")
        );
    }
}
