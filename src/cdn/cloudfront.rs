use crate::app_config::AppConfig;
use crate::cdn::{CacheInvalidator, InvalidationError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use tracing::{info, instrument};

/// Creates the CloudFront invalidator, or `None` when cache invalidation is disabled.
pub async fn new_invalidator(config: &AppConfig) -> Option<CloudFrontInvalidator> {
    if !config.cache().enabled() {
        return None;
    }

    let distribution_id = config.cache().distribution_id()?;
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    Some(CloudFrontInvalidator::new(Client::new(&aws_config), distribution_id))
}

#[derive(Debug)]
pub struct CloudFrontInvalidator {
    client: Client,
    distribution_id: String,
}

impl CloudFrontInvalidator {
    pub fn new(client: Client, distribution_id: impl Into<String>) -> Self {
        CloudFrontInvalidator {
            client,
            distribution_id: distribution_id.into(),
        }
    }
}

#[async_trait]
impl CacheInvalidator for CloudFrontInvalidator {
    #[instrument(skip(self), fields(distribution_id = %self.distribution_id))]
    async fn invalidate(&self, paths: Vec<String>, caller_reference: String) -> Result<(), InvalidationError> {
        let batch = invalidation_batch(paths, caller_reference)?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(&self.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| InvalidationError::Request(Box::new(aws_sdk_cloudfront::Error::from(e))))?;

        let invalidation_id = output.invalidation().map(|invalidation| invalidation.id()).unwrap_or("<unknown>");
        info!(invalidation_id, "🧹 Created invalidation");
        Ok(())
    }
}

fn invalidation_batch(paths: Vec<String>, caller_reference: String) -> Result<InvalidationBatch, InvalidationError> {
    let paths = Paths::builder().quantity(path_quantity(paths.len())?).set_items(Some(paths)).build()?;
    Ok(InvalidationBatch::builder().paths(paths).caller_reference(caller_reference).build()?)
}

fn path_quantity(len: usize) -> Result<i32, InvalidationError> {
    i32::try_from(len).map_err(|_| InvalidationError::TooManyPaths(len))
}
