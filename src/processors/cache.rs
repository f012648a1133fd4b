//! Memoization of prepared tables.
//!
//! Entries are keyed by source path and carry the fingerprint they were built
//! from. A lookup whose size and mtime still match is served without touching
//! the file; otherwise the file is re-read and hashed, and only a changed
//! digest triggers a new pipeline run. Entries are swapped whole under the
//! write lock and the tables behind them are immutable, so readers never see
//! a half-built table.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::config::PipelineOptions;
use crate::error::Result;
use crate::processors::pipeline::{DataPreparer, PreparedTable};
use crate::readers::{digest_bytes, SourceFingerprint, SourceReader};

static GLOBAL_CACHE: Lazy<TableCache> = Lazy::new(TableCache::new);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Size and mtime matched; the file was not read
    Hit,
    /// File was touched but its content hash is unchanged
    Unchanged,
    /// First load of this source
    Loaded,
    /// Content changed and the table was rebuilt
    Reloaded,
}

impl CacheStatus {
    pub fn was_prepared(&self) -> bool {
        matches!(self, CacheStatus::Loaded | CacheStatus::Reloaded)
    }
}

#[derive(Debug, Clone)]
pub struct CachedLoad {
    pub prepared: Arc<PreparedTable>,
    pub fingerprint: SourceFingerprint,
    pub status: CacheStatus,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fingerprint: SourceFingerprint,
    options: PipelineOptions,
    prepared: Arc<PreparedTable>,
}

#[derive(Debug, Clone)]
struct BytesEntry {
    digest: String,
    options: PipelineOptions,
    prepared: Arc<PreparedTable>,
}

#[derive(Debug, Default)]
pub struct TableCache {
    sources: RwLock<HashMap<PathBuf, CacheEntry>>,
    payloads: RwLock<HashMap<String, BytesEntry>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by every session
    pub fn global() -> &'static TableCache {
        &GLOBAL_CACHE
    }

    /// Load a source file, re-running the pipeline only when its content changed
    pub fn load(
        &self,
        path: &Path,
        preparer: &DataPreparer,
        reader: &SourceReader,
    ) -> Result<CachedLoad> {
        let metadata = SourceReader::metadata(path)?;
        let key = cache_key(path);

        let previous = self.read_sources().get(&key).cloned();
        let previous = previous.filter(|entry| &entry.options == preparer.options());

        if let Some(ref entry) = previous {
            if entry.fingerprint.matches_metadata(&metadata) {
                debug!(path = %path.display(), "Table cache hit");
                return Ok(CachedLoad {
                    prepared: Arc::clone(&entry.prepared),
                    fingerprint: entry.fingerprint.clone(),
                    status: CacheStatus::Hit,
                });
            }
        }

        let source = reader.read(path)?;

        if let Some(entry) = previous.as_ref() {
            if entry.fingerprint.digest == source.fingerprint.digest {
                debug!(path = %path.display(), "Source touched but content unchanged");
                let refreshed = CacheEntry {
                    fingerprint: source.fingerprint.clone(),
                    options: entry.options.clone(),
                    prepared: Arc::clone(&entry.prepared),
                };
                self.write_sources().insert(key, refreshed);

                return Ok(CachedLoad {
                    prepared: Arc::clone(&entry.prepared),
                    fingerprint: source.fingerprint,
                    status: CacheStatus::Unchanged,
                });
            }
        }

        let prepared = Arc::new(preparer.prepare_bytes(&source.bytes)?);
        let status = if previous.is_some() {
            CacheStatus::Reloaded
        } else {
            CacheStatus::Loaded
        };
        let short_digest = &source.fingerprint.digest[..12];
        info!(
            path = %path.display(),
            digest = short_digest,
            ?status,
            "Cached prepared table"
        );

        self.write_sources().insert(
            key,
            CacheEntry {
                fingerprint: source.fingerprint.clone(),
                options: preparer.options().clone(),
                prepared: Arc::clone(&prepared),
            },
        );

        Ok(CachedLoad {
            prepared,
            fingerprint: source.fingerprint,
            status,
        })
    }

    /// Prepare in-memory bytes supplied under a caller-chosen key.
    ///
    /// One entry is kept per key; new content for a key replaces the old
    /// table whole.
    pub fn prepare_bytes(
        &self,
        key: &str,
        bytes: &[u8],
        preparer: &DataPreparer,
    ) -> Result<Arc<PreparedTable>> {
        let digest = digest_bytes(bytes);

        if let Some(entry) = self.read_payloads().get(key) {
            if entry.digest == digest && &entry.options == preparer.options() {
                debug!(key, "Payload cache hit");
                return Ok(Arc::clone(&entry.prepared));
            }
        }

        let prepared = Arc::new(preparer.prepare_bytes(bytes)?);
        debug!(key, digest = &digest[..12], "Cached prepared payload");

        self.write_payloads().insert(
            key.to_string(),
            BytesEntry {
                digest,
                options: preparer.options().clone(),
                prepared: Arc::clone(&prepared),
            },
        );

        Ok(prepared)
    }

    /// Forget an in-memory payload
    pub fn invalidate_payload(&self, key: &str) -> bool {
        self.write_payloads().remove(key).is_some()
    }

    /// Forget a source so the next load re-reads it
    pub fn invalidate(&self, path: &Path) -> bool {
        self.write_sources().remove(&cache_key(path)).is_some()
    }

    pub fn clear(&self) {
        self.write_sources().clear();
        self.write_payloads().clear();
    }

    pub fn len(&self) -> usize {
        self.read_sources().len() + self.read_payloads().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are replaced whole, so a poisoned lock still guards consistent data
    fn read_sources(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.sources.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_sources(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.sources.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_payloads(&self) -> RwLockReadGuard<'_, HashMap<String, BytesEntry>> {
        self.payloads.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_payloads(&self) -> RwLockWriteGuard<'_, HashMap<String, BytesEntry>> {
        self.payloads.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use std::fs;
    use tempfile::TempDir;

    const CSV: &str = "Date,Lat,Lon,Predicted_PM25,Actual_PM25\n2023-08-31,38.5,-121.3,40.2,45.0\n";

    #[test]
    fn test_second_load_is_a_hit() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("readings.csv");
        fs::write(&path, CSV)?;

        let cache = TableCache::new();
        let preparer = DataPreparer::default();
        let reader = SourceReader::new();

        let first = cache.load(&path, &preparer, &reader)?;
        let second = cache.load(&path, &preparer, &reader)?;

        assert_eq!(first.status, CacheStatus::Loaded);
        assert_eq!(second.status, CacheStatus::Hit);
        assert!(Arc::ptr_eq(&first.prepared, &second.prepared));
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn test_changed_content_reloads() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("readings.csv");
        fs::write(&path, CSV)?;

        let cache = TableCache::new();
        let preparer = DataPreparer::default();
        let reader = SourceReader::new();

        let first = cache.load(&path, &preparer, &reader)?;
        fs::write(&path, format!("{}2023-09-01,45.5,-122.6,8.0,7.5\n", CSV))?;
        let second = cache.load(&path, &preparer, &reader)?;

        assert_eq!(second.status, CacheStatus::Reloaded);
        assert_eq!(first.prepared.table.len(), 1);
        assert_eq!(second.prepared.table.len(), 2);
        Ok(())
    }

    #[test]
    fn test_invalidate_forces_fresh_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("readings.csv");
        fs::write(&path, CSV)?;

        let cache = TableCache::new();
        let preparer = DataPreparer::default();
        let reader = SourceReader::new();

        cache.load(&path, &preparer, &reader)?;
        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));

        let again = cache.load(&path, &preparer, &reader)?;
        assert_eq!(again.status, CacheStatus::Loaded);
        Ok(())
    }

    #[test]
    fn test_different_options_are_not_shared() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("readings.csv");
        fs::write(&path, CSV)?;

        let cache = TableCache::new();
        let reader = SourceReader::new();
        let default = DataPreparer::default();
        let rounded = DataPreparer::new(PipelineOptions {
            label_precision: Some(0),
            ..Default::default()
        });

        cache.load(&path, &default, &reader)?;
        let other = cache.load(&path, &rounded, &reader)?;

        assert!(other.status.was_prepared());
        assert_eq!(other.prepared.table.records()[0].location_label, "39.0, -121.0");
        Ok(())
    }

    #[test]
    fn test_missing_source_is_not_cached() {
        let cache = TableCache::new();
        let result = cache.load(
            Path::new("no/such/final_predictions.csv.zip"),
            &DataPreparer::default(),
            &SourceReader::new(),
        );

        assert!(matches!(result, Err(ProcessingError::SourceNotFound(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_prepare_bytes_memoizes_by_key_and_digest() -> Result<()> {
        let cache = TableCache::new();
        let preparer = DataPreparer::default();

        let first = cache.prepare_bytes("upload", CSV.as_bytes(), &preparer)?;
        let second = cache.prepare_bytes("upload", CSV.to_string().as_bytes(), &preparer)?;
        assert!(Arc::ptr_eq(&first, &second));

        assert!(cache.invalidate_payload("upload"));
        cache.clear();
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn test_changed_payload_replaces_entry() -> Result<()> {
        let cache = TableCache::new();
        let preparer = DataPreparer::default();
        let updated = format!("{}2023-09-01,45.5,-122.6,8.0,7.5\n", CSV);

        let first = cache.prepare_bytes("upload", CSV.as_bytes(), &preparer)?;
        let second = cache.prepare_bytes("upload", updated.as_bytes(), &preparer)?;

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.table.len(), 2);
        assert_eq!(cache.len(), 1);

        let third = cache.prepare_bytes("upload", CSV.as_bytes(), &preparer)?;
        assert_eq!(third.table.len(), 1);
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn test_concurrent_loads_see_complete_tables() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("readings.csv");
        fs::write(&path, CSV)?;

        let cache = Arc::new(TableCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let path = path.clone();
                std::thread::spawn(move || {
                    cache
                        .load(&path, &DataPreparer::default(), &SourceReader::new())
                        .map(|load| load.prepared.table.len())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap()?, 1);
        }
        Ok(())
    }
}
