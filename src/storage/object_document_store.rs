use crate::app_config::AppConfig;
use crate::storage::{Document, DocumentStore, StorageError};
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Creates the S3 backed store for the configured bucket. Credentials come from the environment.
pub fn new_store(config: &AppConfig) -> Result<ObjectDocumentStore, StorageError> {
    let store = s3_builder(config).build().map_err(backend)?;
    Ok(ObjectDocumentStore::new(Arc::new(store)))
}

fn s3_builder(config: &AppConfig) -> AmazonS3Builder {
    let storage = config.storage();
    let builder = AmazonS3Builder::from_env()
        .with_bucket_name(storage.bucket())
        .with_region(storage.region());

    match storage.endpoint() {
        Some(endpoint) => builder.with_endpoint(endpoint).with_allow_http(endpoint.starts_with("http://")),
        None => builder,
    }
}

#[derive(Debug)]
pub struct ObjectDocumentStore {
    store: Arc<dyn ObjectStore>,
}

impl ObjectDocumentStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        ObjectDocumentStore { store }
    }
}

#[async_trait]
impl DocumentStore for ObjectDocumentStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        match self.store.get(&Path::from(key)).await {
            Ok(result) => {
                let bytes = result.bytes().await.map_err(backend)?;
                debug!(bytes = bytes.len(), "Read document '{}'", key);
                Ok(bytes.to_vec())
            }
            Err(object_store::Error::NotFound { .. }) => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(backend(e)),
        }
    }

    #[instrument(skip(self, document), fields(bytes = document.content.len()))]
    async fn put(&self, key: &str, document: Document) -> Result<(), StorageError> {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, document.content_type.into());
        if let Some(cache_control) = document.cache_control {
            attributes.insert(Attribute::CacheControl, cache_control.into());
        }

        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&Path::from(key), PutPayload::from(document.content), options)
            .await
            .map_err(backend)?;

        debug!("Wrote document '{}'", key);
        Ok(())
    }
}

fn backend(error: object_store::Error) -> StorageError {
    StorageError::Backend(Box::new(error))
}
