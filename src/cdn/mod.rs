mod caller_reference;
mod cloudfront;

pub use caller_reference::CallerReferences;
pub use cloudfront::new_invalidator;

use async_trait::async_trait;
use std::error::Error;
use std::fmt::Debug;
use thiserror::Error;

/// Asks a downstream cache to drop its copies of the given paths.
#[async_trait]
pub trait CacheInvalidator: Debug + Send + Sync {
    async fn invalidate(&self, paths: Vec<String>, caller_reference: String) -> Result<(), InvalidationError>;
}

#[derive(Error, Debug)]
pub enum InvalidationError {
    #[error("invalid invalidation batch: {0}")]
    InvalidBatch(#[from] aws_sdk_cloudfront::error::BuildError),
    #[error("too many paths for one invalidation: {0}")]
    TooManyPaths(usize),
    #[error("invalidation request failed: {0}")]
    Request(#[source] Box<dyn Error + Send + Sync>),
}
