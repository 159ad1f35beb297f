use crate::cdn::{CacheInvalidator, CallerReferences, InvalidationError};
use crate::domain::{LocationLog, LocationLogError, LocationRecord};
use crate::storage::{Document, DocumentStore, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Appends records to the location log document with a plain read-modify-write cycle.
///
/// There is no conditional write: two invocations racing on the same document can each read the same
/// version, and the later write drops the record of the earlier one.
#[derive(Debug)]
pub struct RecordAppender {
    store: Arc<dyn DocumentStore>,
    key: String,
    invalidation: Option<Invalidation>,
}

#[derive(Debug)]
struct Invalidation {
    invalidator: Arc<dyn CacheInvalidator>,
    references: CallerReferences,
    cache_control: String,
}

#[derive(Debug, PartialEq)]
pub struct Appended {
    pub entries: usize,
    pub caller_reference: Option<String>,
}

impl RecordAppender {
    pub fn new(store: Arc<dyn DocumentStore>, key: impl Into<String>) -> Self {
        RecordAppender {
            store,
            key: key.into(),
            invalidation: None,
        }
    }

    /// Turns on the cache-aware variant: writes carry `cache_control` and each write is followed by an invalidation.
    pub fn with_invalidation(mut self, invalidator: Arc<dyn CacheInvalidator>, cache_control: impl Into<String>) -> Self {
        self.invalidation = Some(Invalidation {
            invalidator,
            references: CallerReferences::new(),
            cache_control: cache_control.into(),
        });
        self
    }

    /// The path handed to the cache, the storage key as an absolute path.
    pub fn invalidation_path(&self) -> String {
        format!("/{}", self.key.trim_start_matches('/'))
    }

    #[instrument(skip_all, fields(key = %self.key, timestamp = %record.timestamp))]
    pub async fn append(&self, record: LocationRecord) -> Result<Appended, AppendError> {
        let mut log = self.read_log().await?;
        log.push(&record).map_err(|source| AppendError::Encode { source })?;

        let mut document = Document::json(log.to_json().map_err(|source| AppendError::Encode { source })?);
        if let Some(invalidation) = &self.invalidation {
            document = document.with_cache_control(invalidation.cache_control.clone());
        }

        self.store.put(&self.key, document).await.map_err(|source| AppendError::Write {
            key: self.key.clone(),
            source,
        })?;
        info!(entries = log.len(), "📍 Appended location record");

        let caller_reference = match &self.invalidation {
            Some(invalidation) => Some(self.invalidate(invalidation).await?),
            None => None,
        };

        Ok(Appended {
            entries: log.len(),
            caller_reference,
        })
    }

    async fn read_log(&self) -> Result<LocationLog, AppendError> {
        let content = match self.store.get(&self.key).await {
            Ok(content) => content,
            Err(StorageError::NotFound(_)) => {
                info!("No location log stored yet, starting a new one");
                return Ok(LocationLog::new());
            }
            Err(source) => {
                return Err(AppendError::Read {
                    key: self.key.clone(),
                    source,
                });
            }
        };

        match LocationLog::from_json(&content) {
            Ok(log) => {
                debug!(entries = log.len(), "Read location log");
                Ok(log)
            }
            Err(LocationLogError::NotAnArray(kind)) => {
                warn!("⚠️ Stored location log is a JSON {}, not an array. Starting over with an empty log", kind);
                Ok(LocationLog::new())
            }
            Err(source) => Err(AppendError::CorruptDocument {
                key: self.key.clone(),
                source,
            }),
        }
    }

    async fn invalidate(&self, invalidation: &Invalidation) -> Result<String, AppendError> {
        let path = self.invalidation_path();
        let caller_reference = invalidation.references.next_reference();

        invalidation
            .invalidator
            .invalidate(vec![path.clone()], caller_reference.clone())
            .await
            .map_err(|source| AppendError::Invalidation { path, source })?;

        Ok(caller_reference)
    }
}

#[derive(Error, Debug)]
pub enum AppendError {
    #[error("unable to read '{key}': {source}")]
    Read { key: String, source: StorageError },
    #[error("stored document '{key}' cannot be decoded: {source}")]
    CorruptDocument { key: String, source: LocationLogError },
    #[error("{source}")]
    Encode { source: LocationLogError },
    #[error("unable to write '{key}': {source}")]
    Write { key: String, source: StorageError },
    #[error("record was written but invalidating '{path}' failed: {source}")]
    Invalidation { path: String, source: InvalidationError },
}

impl AppendError {
    /// Whether the record made it into storage despite the error.
    pub fn is_persisted(&self) -> bool {
        matches!(self, AppendError::Invalidation { .. })
    }
}
