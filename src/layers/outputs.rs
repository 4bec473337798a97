//! Stack outputs.
//!
//! Every value is built from a handle returned by an earlier declaration, so
//! publishing has no failure mode of its own.

use tracing::info;

use super::api::Api;
use super::database::Database;
use super::edge::Edge;
use super::pipeline::Pipeline;
use crate::stack::StackBuilder;

/// Logical ids of the published outputs, in publishing order
pub const OUTPUT_IDS: [&str; 4] = [
    "WebsiteURL",
    "ApiURL",
    "DatabaseEndpoint",
    "PipelineSourceBucket",
];

pub fn publish(
    builder: &mut StackBuilder,
    edge: &Edge,
    api: &Api,
    database: &Database,
    pipeline: &Pipeline,
) {
    info!(count = OUTPUT_IDS.len(), "publishing outputs");

    builder.output(OUTPUT_IDS[0], "Website URL", edge.website_url());
    builder.output(OUTPUT_IDS[1], "API Gateway URL", api.url());
    builder.output(OUTPUT_IDS[2], "RDS Database Endpoint", database.endpoint());
    builder.output(
        OUTPUT_IDS[3],
        "Pipeline Source S3 Bucket",
        pipeline.source.bucket.reference(),
    );
}
