//! Gzip-compressed JSON documents on disk with a metadata index.

use super::{check_id, document_id, lock, DocumentStorage, StorageRecord};
use crate::error::{Error, Result};
use crate::model::{Document, Metadata};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const INDEX_DIR: &str = "_metadata";
const INDEX_FILE: &str = "index.json";

/// File-backed document store.
///
/// Documents live at `<root>/<first two chars of id>/<id>.json.gz`; the index
/// at `<root>/_metadata/index.json` is rewritten after every change.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
    compression: Compression,
    index: Mutex<BTreeMap<String, StorageRecord>>,
}

impl FileStorage {
    /// Open a store at `root`, creating it if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(INDEX_DIR))?;
        let index_path = root.join(INDEX_DIR).join(INDEX_FILE);
        let index = if index_path.exists() {
            let reader = BufReader::new(File::open(&index_path)?);
            let records: Vec<StorageRecord> = serde_json::from_reader(reader)?;
            records.into_iter().map(|r| (r.id.clone(), r)).collect()
        } else {
            BTreeMap::new()
        };
        log::debug!("Opened file storage at {} ({} documents)", root.display(), index.len());
        Ok(Self {
            root,
            compression: Compression::default(),
            index: Mutex::new(index),
        })
    }

    /// Set the gzip level (0-9).
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document stored under `id`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        let shard: String = id.chars().take(2).collect();
        self.root.join(shard).join(format!("{}.json.gz", id))
    }

    fn write_index(&self, index: &BTreeMap<String, StorageRecord>) -> Result<()> {
        let dir = self.root.join(INDEX_DIR);
        let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            let records: Vec<&StorageRecord> = index.values().collect();
            serde_json::to_writer_pretty(&mut writer, &records)?;
            writer.flush()?;
        }
        fs::rename(tmp, dir.join(INDEX_FILE))?;
        Ok(())
    }
}

impl DocumentStorage for FileStorage {
    fn save(&self, doc: &Document, id: Option<&str>) -> Result<String> {
        let id = match id {
            Some(id) => id.to_string(),
            None => document_id(doc)?,
        };
        check_id(&id)?;

        let path = self.path_for(&id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut encoder = GzEncoder::new(BufWriter::new(File::create(&path)?), self.compression);
        serde_json::to_writer(&mut encoder, doc)?;
        encoder.finish()?.flush()?;

        let mut index = lock(&self.index);
        index.insert(id.clone(), StorageRecord::describe(id.clone(), doc));
        self.write_index(&index)?;
        log::debug!("Saved document '{}' to {}", id, path.display());
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<Document> {
        check_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }
        let decoder = GzDecoder::new(BufReader::new(File::open(&path)?));
        Ok(serde_json::from_reader(decoder)?)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        check_id(id)?;
        let path = self.path_for(id);
        let existed = path.exists();
        if existed {
            fs::remove_file(&path)?;
        }
        let mut index = lock(&self.index);
        if index.remove(id).is_some() {
            self.write_index(&index)?;
        }
        Ok(existed)
    }

    fn list(&self, filter: &Metadata) -> Result<Vec<StorageRecord>> {
        Ok(lock(&self.index)
            .values()
            .filter(|record| record.matches(filter))
            .cloned()
            .collect())
    }

    fn exists(&self, id: &str) -> bool {
        check_id(id).is_ok() && self.path_for(id).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_layout() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert_eq!(
            storage.path_for("abc123"),
            dir.path().join("ab").join("abc123.json.gz")
        );
        assert!(dir.path().join(INDEX_DIR).is_dir());
    }

    #[test]
    fn test_save_writes_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let doc = Document::with_symbols("xy-1", "hello\n");
        storage.save(&doc, None).unwrap();

        let bytes = fs::read(storage.path_for("xy-1")).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let doc = Document::with_symbols("", "x");
        assert!(matches!(
            storage.save(&doc, Some("../escape")),
            Err(Error::Validation(_))
        ));
        assert!(!storage.exists("../escape"));
    }
}
