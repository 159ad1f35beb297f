mod object_document_store;

pub use object_document_store::new_store;

use async_trait::async_trait;
use std::error::Error;
use std::fmt::Debug;
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Reads and writes whole documents under a key of one fixed bucket.
#[async_trait]
pub trait DocumentStore: Debug + Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn put(&self, key: &str, document: Document) -> Result<(), StorageError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub content: Vec<u8>,
    pub content_type: &'static str,
    pub cache_control: Option<String>,
}

impl Document {
    pub fn json(content: Vec<u8>) -> Self {
        Document {
            content,
            content_type: JSON_CONTENT_TYPE,
            cache_control: None,
        }
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no document stored under '{0}'")]
    NotFound(String),
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn Error + Send + Sync>),
}
