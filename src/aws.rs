//! # AWS Environment Discovery
//!
//! Fills in the target account and region when the caller did not supply
//! them, the same way the AWS CLI would: region from the default provider
//! chain (`AWS_REGION`, profile, IMDS), account from STS `GetCallerIdentity`.
//!
//! Nothing here runs during synthesis itself; the CLI resolves the
//! environment first and hands a concrete [`StackEnvironment`] to
//! [`crate::stack::synthesize`].

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_sts::Client as StsClient;
use tracing::{debug, info};

use crate::config::StackEnvironment;
use crate::error::StackError;

/// Resolve the target environment, querying AWS only for what is missing
///
/// # Errors
///
/// [`StackError::EnvironmentLookup`] if no region is configured or the
/// caller identity cannot be fetched.
pub async fn discover_environment(
    account: Option<String>,
    region: Option<String>,
) -> Result<StackEnvironment, StackError> {
    if let (Some(account), Some(region)) = (&account, &region) {
        debug!(%account, %region, "using explicit environment");
        return Ok(StackEnvironment::new(account, region));
    }

    let sdk_config = load_sdk_config(region.as_deref()).await;

    let region = match region {
        Some(region) => region,
        None => sdk_config
            .region()
            .map(ToString::to_string)
            .ok_or_else(|| {
                StackError::EnvironmentLookup(
                    "no region configured; pass --region or set CDK_DEFAULT_REGION / AWS_REGION"
                        .to_string(),
                )
            })?,
    };

    let account = match account {
        Some(account) => account,
        None => caller_account(&sdk_config).await?,
    };

    info!(%account, %region, "discovered AWS environment");
    Ok(StackEnvironment::new(account, region))
}

async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest());
    match region {
        Some(region) => {
            loader
                .region(aws_config::Region::new(region.to_string()))
                .load()
                .await
        }
        None => loader.load().await,
    }
}

async fn caller_account(sdk_config: &SdkConfig) -> Result<String, StackError> {
    let client = StsClient::new(sdk_config);
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| StackError::EnvironmentLookup(format!("GetCallerIdentity failed: {e}")))?;

    identity.account().map(ToString::to_string).ok_or_else(|| {
        StackError::EnvironmentLookup("GetCallerIdentity returned no account".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_environment_needs_no_lookup() {
        let environment =
            discover_environment(Some("111122223333".to_string()), Some("eu-west-1".to_string()))
                .await
                .unwrap();
        assert_eq!(environment, StackEnvironment::new("111122223333", "eu-west-1"));
    }
}
