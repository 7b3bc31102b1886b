//! Document caching and persistence.
//!
//! Conversion itself does no I/O. These collaborators sit around it: an
//! in-memory LRU cache, file and memory stores, and batch helpers that fan
//! work out on a bounded worker pool.

mod batch;
mod cache;
mod file;

pub use batch::{convert_batch, load_batch, save_batch, BatchItem, BatchOptions, BatchOutcome, CancelFlag};
pub use cache::{CacheStats, DocumentCache, LruCache};
pub use file::FileStorage;

use crate::error::{Error, Result};
use crate::model::{Document, Metadata};
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Index entry describing a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub id: String,

    /// When the document was last saved
    pub saved_at: DateTime<Utc>,

    pub page_count: usize,

    /// Length of the text buffer in chars
    pub symbol_count: usize,

    /// Non-empty layer names
    pub layers: Vec<String>,

    /// Copy of the document metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl StorageRecord {
    /// Describe `doc` as saved now under `id`.
    pub fn describe(id: impl Into<String>, doc: &Document) -> Self {
        Self {
            id: id.into(),
            saved_at: Utc::now(),
            page_count: doc.page_count(),
            symbol_count: doc.symbol_count(),
            layers: doc
                .layers()
                .filter(|(_, entities)| !entities.is_empty())
                .map(|(name, _)| name.to_string())
                .collect(),
            metadata: doc.metadata.clone(),
        }
    }

    /// Every filter key is present in the metadata with an equal value.
    pub fn matches(&self, filter: &Metadata) -> bool {
        filter
            .iter()
            .all(|(key, value)| self.metadata.get(key) == Some(value))
    }
}

/// Trait for document stores.
pub trait DocumentStorage: Send + Sync {
    /// Save a document under `id`, or under [`document_id`] when `None`; returns the id used.
    fn save(&self, doc: &Document, id: Option<&str>) -> Result<String>;

    /// Load a document, failing with [`Error::NotFound`] if absent.
    fn load(&self, id: &str) -> Result<Document>;

    /// Delete a document; returns whether it existed.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Records whose metadata matches `filter`, ordered by id.
    fn list(&self, filter: &Metadata) -> Result<Vec<StorageRecord>>;

    /// Check if a document is stored.
    fn exists(&self, id: &str) -> bool;
}

/// The document's own id, or the MD5 hex digest of its compact JSON.
pub fn document_id(doc: &Document) -> Result<String> {
    if !doc.id.is_empty() {
        return Ok(doc.id.clone());
    }
    let json = serde_json::to_vec(doc)?;
    Ok(format!("{:x}", Md5::digest(&json)))
}

/// Reject ids that cannot be used as a file name.
pub(crate) fn check_id(id: &str) -> Result<()> {
    let bad = id.is_empty()
        || id == "."
        || id.contains("..")
        || id.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(Error::Validation(format!("invalid document id: {:?}", id)));
    }
    Ok(())
}

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: Mutex<HashMap<String, (Document, StorageRecord)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.documents).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStorage for MemoryStorage {
    fn save(&self, doc: &Document, id: Option<&str>) -> Result<String> {
        let id = match id {
            Some(id) => id.to_string(),
            None => document_id(doc)?,
        };
        check_id(&id)?;
        let record = StorageRecord::describe(id.clone(), doc);
        lock(&self.documents).insert(id.clone(), (doc.clone(), record));
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<Document> {
        lock(&self.documents)
            .get(id)
            .map(|(doc, _)| doc.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(lock(&self.documents).remove(id).is_some())
    }

    fn list(&self, filter: &Metadata) -> Result<Vec<StorageRecord>> {
        let mut records: Vec<StorageRecord> = lock(&self.documents)
            .values()
            .map(|(_, record)| record)
            .filter(|record| record.matches(filter))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn exists(&self, id: &str) -> bool {
        lock(&self.documents).contains_key(id)
    }
}
