//! Persistent detection cache using redb.
//!
//! Cache structure:
//! - Database: .gemrank.cache/languages.redb (redb provides ACID guarantees)
//! - Key: "{app_id}/{review_id}"
//! - Value: bincode-serialized CacheEntry
//!
//! Inserts are buffered in memory and written in one transaction on `flush`,
//! so a long summarization run commits once per batch of apps instead of once
//! per review.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DetectionCache, DetectionKey};
use crate::error::{GemError, Result};

/// Key = encoded DetectionKey, Value = serialized CacheEntry
const LANGUAGES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("languages");

pub const CACHE_DIR: &str = ".gemrank.cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CacheEntry {
    /// Detected language code ("unknown" when detection failed)
    language: String,
}

impl CacheEntry {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GemError::Cache(format!("serialize entry: {e}")))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| GemError::Cache(format!("deserialize entry: {e}")))
    }
}

fn cache_err<E: Into<redb::Error>>(context: &str) -> impl Fn(E) -> GemError + '_ {
    move |e| GemError::Cache(format!("{context}: {}", e.into()))
}

/// Detection cache backed by redb.
pub struct RedbDetectionCache {
    db: Database,
    path: PathBuf,
    pending: HashMap<String, String>,
}

impl RedbDetectionCache {
    /// Open or create the cache database.
    ///
    /// Cache location: `<root>/.gemrank.cache/languages.redb`
    pub fn open(root: &Path) -> Result<Self> {
        let cache_dir = root.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir).map_err(|e| GemError::io(&cache_dir, e))?;

        let path = cache_dir.join("languages.redb");
        let db = Database::create(&path)
            .map_err(|e| GemError::Cache(format!("open {}: {e}", path.display())))?;

        debug!(path = %path.display(), "detection cache opened");
        Ok(Self {
            db,
            path,
            pending: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detections not yet written to disk.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn read(&self, encoded: &str) -> Option<String> {
        let read_txn = self.db.begin_read().ok()?;
        let table = read_txn.open_table(LANGUAGES_TABLE).ok()?;
        let value_guard = table.get(encoded).ok()??;
        CacheEntry::from_bytes(value_guard.value()).ok().map(|e| e.language)
    }

    /// Remove every persisted and pending entry.
    pub fn clear(&mut self) -> Result<()> {
        self.pending.clear();
        let write_txn = self
            .db
            .begin_write()
            .map_err(cache_err("begin clear"))?;
        {
            let mut table = write_txn
                .open_table(LANGUAGES_TABLE)
                .map_err(cache_err("open table"))?;
            table
                .retain(|_, _| false)
                .map_err(cache_err("clear table"))?;
        }
        write_txn
            .commit()
            .map_err(cache_err("commit clear"))?;
        Ok(())
    }

    /// Persisted entry count and approximate size.
    pub fn stats(&self) -> CacheStats {
        let Ok(read_txn) = self.db.begin_read() else {
            return CacheStats::default();
        };
        let Ok(table) = read_txn.open_table(LANGUAGES_TABLE) else {
            return CacheStats::default();
        };

        let entries = table.len().unwrap_or(0) as usize;
        let size_bytes = table
            .iter()
            .ok()
            .into_iter()
            .flatten()
            .filter_map(|r| r.ok())
            .map(|(k, v)| k.value().len() + v.value().len())
            .sum::<usize>() as u64;

        CacheStats { entries, size_bytes }
    }
}

impl DetectionCache for RedbDetectionCache {
    fn get(&self, key: &DetectionKey) -> Option<String> {
        let encoded = key.encoded();
        self.pending
            .get(&encoded)
            .cloned()
            .or_else(|| self.read(&encoded))
    }

    fn insert(&mut self, key: DetectionKey, language: String) {
        self.pending.insert(key.encoded(), language);
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let write_txn = self
            .db
            .begin_write()
            .map_err(cache_err("begin write"))?;
        {
            let mut table = write_txn
                .open_table(LANGUAGES_TABLE)
                .map_err(cache_err("open table"))?;
            for (key, language) in &self.pending {
                let bytes = CacheEntry {
                    language: language.clone(),
                }
                .to_bytes()?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(cache_err("insert"))?;
            }
        }
        write_txn
            .commit()
            .map_err(cache_err("commit"))?;

        debug!(entries = self.pending.len(), "detection cache flushed");
        self.pending.clear();
        Ok(())
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of persisted detections
    pub entries: usize,
    /// Approximate total size in bytes (keys + values)
    pub size_bytes: u64,
}

impl CacheStats {
    /// Format size in human-readable form (KB, MB, GB)
    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size_bytes >= GB {
            format!("{:.2} GB", self.size_bytes as f64 / GB as f64)
        } else if self.size_bytes >= MB {
            format!("{:.2} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.2} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} B", self.size_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serialization() {
        let entry = CacheEntry {
            language: "zh-cn".into(),
        };
        let decoded = CacheEntry::from_bytes(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(entry, decoded);
    }

    #[test]
    fn test_pending_until_flush() {
        let dir = tempfile::tempdir().unwrap();
        let key = DetectionKey::new("373390", "42");

        let mut cache = RedbDetectionCache::open(dir.path()).unwrap();
        cache.insert(key.clone(), "en".into());
        assert_eq!(cache.pending(), 1);
        // Buffered entries are visible before the flush
        assert_eq!(cache.get(&key).as_deref(), Some("en"));
        assert_eq!(cache.stats().entries, 0);

        cache.flush().unwrap();
        assert_eq!(cache.pending(), 0);
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = DetectionKey::new("10", "r7");
        {
            let mut cache = RedbDetectionCache::open(dir.path()).unwrap();
            cache.insert(key.clone(), "de".into());
            cache.flush().unwrap();
        }

        let mut cache = RedbDetectionCache::open(dir.path()).unwrap();
        let lang = cache.get_or_compute(&key, &mut || panic!("should be cached"));
        assert_eq!(lang, "de");
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = RedbDetectionCache::open(dir.path()).unwrap();
        cache.insert(DetectionKey::new("1", "a"), "en".into());
        cache.insert(DetectionKey::new("1", "b"), "fr".into());
        cache.flush().unwrap();
        assert_eq!(cache.stats().entries, 2);
        assert!(cache.stats().size_human().ends_with('B'));

        cache.clear().unwrap();
        assert_eq!(cache.stats().entries, 0);
    }
}
