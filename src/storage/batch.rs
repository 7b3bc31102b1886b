//! Batch save, load and convert on a bounded worker pool.

use super::{document_id, DocumentStorage};
use crate::convert::ForwardConverter;
use crate::error::{Error, Result};
use crate::model::{Document, SourceDocument};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a batch from starting further items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Batch options.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Upper bound on worker threads
    pub max_workers: usize,
    pub cancel: CancelFlag,
}

impl BatchOptions {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            cancel: CancelFlag::new(),
        }
    }

    /// Share an existing cancel flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(workers)
    }
}

/// What happened to one batch item.
#[derive(Debug)]
pub enum BatchOutcome<T> {
    Done(T),
    Failed(Error),
    /// Not started because the batch was cancelled
    Skipped,
}

impl<T> BatchOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, BatchOutcome::Done(_))
    }

    /// Convert into a `Result`, treating a skip as an error.
    pub fn into_result(self) -> Result<T> {
        match self {
            BatchOutcome::Done(value) => Ok(value),
            BatchOutcome::Failed(err) => Err(err),
            BatchOutcome::Skipped => Err(Error::Other("batch item skipped".into())),
        }
    }
}

/// One batch result, keyed by document id.
#[derive(Debug)]
pub struct BatchItem<T> {
    pub id: String,
    pub outcome: BatchOutcome<T>,
}

fn run_batch<I, T, K, W>(items: &[I], options: &BatchOptions, key: K, work: W) -> Result<Vec<BatchItem<T>>>
where
    I: Sync,
    T: Send,
    K: Fn(&I) -> String + Sync,
    W: Fn(&I) -> Result<T> + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(options.max_workers.max(1))
        .build()
        .map_err(|e| Error::Other(format!("failed to start worker pool: {}", e)))?;

    let mut results: Vec<(usize, BatchItem<T>)> = pool.install(|| {
        items
            .par_iter()
            .enumerate()
            .map(|(index, item)| {
                let id = key(item);
                let outcome = if options.cancel.is_cancelled() {
                    BatchOutcome::Skipped
                } else {
                    match work(item) {
                        Ok(value) => BatchOutcome::Done(value),
                        Err(err) => {
                            log::warn!("Batch item '{}' failed: {}", id, err);
                            BatchOutcome::Failed(err)
                        }
                    }
                };
                (index, BatchItem { id, outcome })
            })
            .collect()
    });

    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, item)| item).collect())
}

/// Save documents in parallel; each item carries the id it was saved under.
pub fn save_batch<S>(storage: &S, docs: &[Document], options: &BatchOptions) -> Result<Vec<BatchItem<String>>>
where
    S: DocumentStorage + ?Sized,
{
    run_batch(
        docs,
        options,
        |doc| document_id(doc).unwrap_or_else(|_| doc.id.clone()),
        |doc| storage.save(doc, None),
    )
}

/// Load documents in parallel.
pub fn load_batch<S>(storage: &S, ids: &[String], options: &BatchOptions) -> Result<Vec<BatchItem<Document>>>
where
    S: DocumentStorage + ?Sized,
{
    run_batch(ids, options, |id| id.clone(), |id| storage.load(id))
}

/// Run forward conversion over many sources in parallel.
pub fn convert_batch(
    converter: &ForwardConverter,
    sources: &[SourceDocument],
    options: &BatchOptions,
) -> Result<Vec<BatchItem<Document>>> {
    run_batch(sources, options, |source| source.id.clone(), |source| converter.convert(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_load_batch_isolates_failures() {
        let storage = MemoryStorage::new();
        storage.save(&Document::with_symbols("a", "x"), None).unwrap();
        storage.save(&Document::with_symbols("c", "z"), None).unwrap();

        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let results = load_batch(&storage, &ids, &BatchOptions::new(2)).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[1].id, "b");
        assert!(results[0].outcome.is_done());
        assert!(matches!(results[1].outcome, BatchOutcome::Failed(Error::NotFound(_))));
        assert!(results[2].outcome.is_done());
    }

    #[test]
    fn test_cancelled_batch_skips() {
        let storage = MemoryStorage::new();
        let options = BatchOptions::new(1);
        options.cancel.cancel();

        let docs = vec![Document::with_symbols("a", "x")];
        let results = save_batch(&storage, &docs, &options).unwrap();
        assert!(matches!(results[0].outcome, BatchOutcome::Skipped));
        assert!(storage.is_empty());
    }
}
