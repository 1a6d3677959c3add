//! On-disk storage for fetched catalog documents, keyed by URL.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::entry::CacheEntry;

/// Storage for cached catalog documents.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Root directory for cache.
    root: PathBuf,
}

impl CacheStore {
    /// Create a new cache store.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create cache directory {:?}", self.root))
    }

    /// Get the path for storing a URL's content.
    pub fn content_path(&self, url: &str) -> PathBuf {
        let hash = Sha256::digest(url.as_bytes());
        self.root.join(hex::encode(&hash[..16]))
    }

    fn metadata_path(&self, url: &str) -> PathBuf {
        self.content_path(url).with_extension("meta.json")
    }

    /// Store content and return a cache entry.
    ///
    /// Overwrites any previous entry for the same URL.
    pub fn store(&self, url: &str, content: &str, ttl_seconds: u64) -> Result<CacheEntry> {
        self.ensure_dir()?;

        let content_path = self.content_path(url);
        fs::write(&content_path, content)
            .with_context(|| format!("Failed to write cache content {:?}", content_path))?;

        let entry = CacheEntry::fetched(url, &content_path, content.len() as u64, ttl_seconds);

        let json = serde_json::to_string_pretty(&entry)?;
        fs::write(self.metadata_path(url), json)?;

        Ok(entry)
    }

    /// Load a cached entry's metadata.
    pub fn load(&self, url: &str) -> Result<Option<CacheEntry>> {
        let meta_path = self.metadata_path(url);

        if !meta_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&meta_path)?;
        let entry: CacheEntry = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt cache metadata {:?}", meta_path))?;

        Ok(Some(entry))
    }

    /// Read the cached content.
    ///
    /// The path is derived from the URL, not `entry.content_path`, so a
    /// cache directory restored to a new location stays readable.
    pub fn read_content(&self, entry: &CacheEntry) -> Result<String> {
        let path = self.content_path(&entry.url);
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cached content from {:?}", path))
    }

    /// Remove a cached entry.
    pub fn remove(&self, url: &str) -> Result<bool> {
        let mut removed = false;

        for path in [self.content_path(url), self.metadata_path(url)] {
            if path.exists() {
                fs::remove_file(&path)?;
                removed = true;
            }
        }

        Ok(removed)
    }

    /// List all cached entries, newest first.
    ///
    /// Unreadable metadata files are skipped.
    pub fn list(&self) -> Result<Vec<CacheEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();

            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(json) = fs::read_to_string(&path) {
                    if let Ok(cache_entry) = serde_json::from_str::<CacheEntry>(&json) {
                        entries.push(cache_entry);
                    }
                }
            }
        }

        entries.sort_by(|a, b| b.metadata.fetched_at.cmp(&a.metadata.fetched_at));
        Ok(entries)
    }

    /// Clear all cached entries.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.list()?;
        let count = entries.len();

        for entry in entries {
            let _ = self.remove(&entry.url);
        }

        Ok(count)
    }

    /// Get total cache size in bytes.
    pub fn total_size(&self) -> Result<u64> {
        let entries = self.list()?;
        Ok(entries.iter().map(|e| e.metadata.size_bytes).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Document;
    use tempfile::TempDir;

    const INDEX_URL: &str = "https://example.com/releases-index.json";

    #[test]
    fn store_and_load() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        let entry = store.store(INDEX_URL, "{}", 3600).unwrap();
        assert_eq!(entry.url, INDEX_URL);
        assert_eq!(entry.document, Document::Index);
        assert_eq!(entry.metadata.size_bytes, 2);

        let loaded = store.load(INDEX_URL).unwrap().unwrap();
        assert_eq!(loaded.url, INDEX_URL);
        assert_eq!(store.read_content(&loaded).unwrap(), "{}");
    }

    #[test]
    fn store_overwrites_previous_content() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.store(INDEX_URL, "old", 3600).unwrap();
        let entry = store.store(INDEX_URL, "new", 3600).unwrap();

        assert_eq!(store.read_content(&entry).unwrap(), "new");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn load_nonexistent_returns_none() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        assert!(store.load(INDEX_URL).unwrap().is_none());
    }

    #[test]
    fn corrupt_metadata_is_an_error() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.store(INDEX_URL, "{}", 3600).unwrap();
        fs::write(store.metadata_path(INDEX_URL), "not json").unwrap();

        assert!(store.load(INDEX_URL).is_err());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn remove_entry() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.store(INDEX_URL, "{}", 3600).unwrap();

        assert!(store.remove(INDEX_URL).unwrap());
        assert!(store.load(INDEX_URL).unwrap().is_none());
        assert!(!store.remove(INDEX_URL).unwrap());
    }

    #[test]
    fn list_on_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path().join("never-created"));

        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn clear_and_total_size() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        store.store("https://a/1.json", "12345", 3600).unwrap();
        store.store("https://a/2.json", "1234567890", 3600).unwrap();

        assert_eq!(store.total_size().unwrap(), 15);
        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn content_path_is_deterministic_per_url() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());

        assert_eq!(store.content_path(INDEX_URL), store.content_path(INDEX_URL));
        assert_ne!(
            store.content_path("https://a/8.0/releases.json"),
            store.content_path("https://a/9.0/releases.json")
        );
    }
}
