//! # Edge Layer
//!
//! The static site: a website bucket and a CloudFront distribution whose
//! single origin is that bucket's website endpoint. Viewers are redirected to
//! HTTPS, and a 404 from the origin is rewritten to `/index.html` with status
//! 200 so client-side routes of a single-page application resolve.

use serde_json::json;
use tracing::info;

use super::storage::{declare_bucket, AutoDeleteProvider, Bucket, WebsiteConfig};
use crate::constants::{
    CACHING_OPTIMIZED_POLICY_ID, WEBSITE_ERROR_DOCUMENT, WEBSITE_INDEX_DOCUMENT,
};
use crate::error::StackError;
use crate::naming::{BucketRole, NameBuilder};
use crate::stack::StackBuilder;
use crate::template::intrinsic::{join, select, split};
use crate::template::{Resource, ResourceHandle};

const ORIGIN_ID: &str = "WebsiteOrigin";

#[derive(Debug, Clone)]
pub struct Edge {
    pub website: Bucket,
    pub distribution: ResourceHandle,
}

impl Edge {
    /// `https://{distribution domain}`
    #[must_use]
    pub fn website_url(&self) -> serde_json::Value {
        join(
            "",
            vec![json!("https://"), self.distribution.attr("DomainName")],
        )
    }
}

pub fn declare(
    builder: &mut StackBuilder,
    names: &NameBuilder,
    provider: &AutoDeleteProvider,
) -> Result<Edge, StackError> {
    info!("declaring edge layer");

    let website = declare_bucket(
        builder,
        provider,
        "WebsiteBucket",
        names.bucket(BucketRole::Website)?,
        Some(WebsiteConfig {
            index_document: WEBSITE_INDEX_DOCUMENT,
            error_document: WEBSITE_ERROR_DOCUMENT,
        }),
    )?;

    // Website endpoint host: the third segment of "http://{host}"
    let origin_domain = select(2, split("/", website.bucket.attr("WebsiteURL")));

    let distribution = builder.declare(
        Resource::new("WebsiteDistribution", "AWS::CloudFront::Distribution").properties(json!({
            "DistributionConfig": {
                "Enabled": true,
                "Comment": format!("{} static site", names.stack_prefix()),
                "HttpVersion": "http2",
                "IPV6Enabled": true,
                "DefaultRootObject": WEBSITE_INDEX_DOCUMENT,
                "Origins": [{
                    "Id": ORIGIN_ID,
                    "DomainName": origin_domain,
                    "CustomOriginConfig": {
                        "OriginProtocolPolicy": "http-only",
                        "OriginSSLProtocols": ["TLSv1.2"]
                    }
                }],
                "DefaultCacheBehavior": {
                    "TargetOriginId": ORIGIN_ID,
                    "ViewerProtocolPolicy": "redirect-to-https",
                    "CachePolicyId": CACHING_OPTIMIZED_POLICY_ID,
                    "Compress": true
                },
                "CustomErrorResponses": [{
                    "ErrorCode": 404,
                    "ResponseCode": 200,
                    "ResponsePagePath": format!("/{WEBSITE_INDEX_DOCUMENT}")
                }]
            }
        })),
    )?;

    Ok(Edge {
        website,
        distribution,
    })
}
