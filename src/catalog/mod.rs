//! Release catalog access.
//!
//! [`ReleaseCatalog`] fetches the release index and per-channel manifests,
//! caching each response on disk keyed by URL. One catalog is one session:
//! call [`ReleaseCatalog::open`] before resolving a batch and
//! [`ReleaseCatalog::flush`] after it to carry the disk cache across runs
//! through an [`ArtifactCache`].
//!
//! A document fetched successfully is memoized in memory and never
//! re-read during the lifetime of the catalog.

pub mod fetch;
pub mod schema;

pub use fetch::HttpFetcher;
pub use schema::{
    Artifact, ArtifactFile, Release, ReleaseChannel, ReleaseManifest, ReleaseType,
    ReleasesIndex, SupportPhase,
};

use chrono::Utc;
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::cache::{
    durable_key, restore_prefix, ArtifactCache, CacheStore, CacheValidator, SaveOutcome,
};
use crate::config::EngineConfig;
use crate::error::{PlanError, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cached, read-mostly view of the remote release catalog.
pub struct ReleaseCatalog {
    index_url: String,
    ttl_secs: u64,
    store: Option<CacheStore>,
    fetcher: HttpFetcher,
    durable: Option<Box<dyn ArtifactCache>>,
    index: Mutex<Option<Arc<ReleasesIndex>>>,
    manifests: Mutex<HashMap<String, Arc<ReleaseManifest>>>,
    requested: Mutex<BTreeSet<String>>,
    restored_key: Mutex<Option<String>>,
}

impl ReleaseCatalog {
    /// Create a catalog from engine settings.
    ///
    /// With caching disabled every document is fetched fresh (once per
    /// catalog) and nothing is written to disk.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let store = config
            .cache_enabled
            .then(|| CacheStore::new(&config.cache_dir));

        Ok(Self {
            index_url: config.index_url.clone(),
            ttl_secs: config.cache_ttl_secs,
            store,
            fetcher: HttpFetcher::with_timeout(config.http_timeout())?,
            durable: None,
            index: Mutex::new(None),
            manifests: Mutex::new(HashMap::new()),
            requested: Mutex::new(BTreeSet::new()),
            restored_key: Mutex::new(None),
        })
    }

    /// Attach a durable cache used by [`open`](Self::open) and [`flush`](Self::flush).
    pub fn with_durable_cache(mut self, cache: impl ArtifactCache + 'static) -> Self {
        self.durable = Some(Box::new(cache));
        self
    }

    /// URL of the release index.
    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// The local cache store, when caching is enabled.
    pub fn store(&self) -> Option<&CacheStore> {
        self.store.as_ref()
    }

    /// Start a batch: restore the local cache from the durable cache.
    ///
    /// Returns the restored key. Failures are logged and ignored.
    pub fn open(&self) -> Option<String> {
        let (Some(store), Some(durable)) = (&self.store, &self.durable) else {
            return None;
        };

        let prefix = restore_prefix(Utc::now());
        match durable.restore(&[store.root().to_path_buf()], &[prefix]) {
            Ok(Some(key)) => {
                info!("Restored release metadata cache from {}", key);
                *lock(&self.restored_key) = Some(key.clone());
                Some(key)
            }
            Ok(None) => {
                debug!("No durable release metadata cache for the current window");
                None
            }
            Err(e) => {
                let err = PlanError::CacheUnavailable {
                    message: format!("restore failed: {:#}", e),
                };
                warn!("{}", err);
                None
            }
        }
    }

    /// End a batch: persist the local cache under a key derived from the
    /// URLs requested during the batch.
    ///
    /// Returns the key when something was saved. Failures are logged and ignored.
    pub fn flush(&self) -> Option<String> {
        let (Some(store), Some(durable)) = (&self.store, &self.durable) else {
            return None;
        };

        let urls = self.requested_urls();
        if urls.is_empty() {
            return None;
        }

        let key = durable_key(&urls, Utc::now());
        if lock(&self.restored_key).as_deref() == Some(key.as_str()) {
            debug!("Durable cache {} was restored unchanged, skipping save", key);
            return None;
        }

        match durable.save(&[store.root().to_path_buf()], &key) {
            Ok(SaveOutcome::Saved) => {
                info!("Saved release metadata cache as {}", key);
                Some(key)
            }
            Ok(SaveOutcome::AlreadyExists) => {
                debug!("Durable cache {} already exists", key);
                None
            }
            Err(e) => {
                let err = PlanError::CacheUnavailable {
                    message: format!("save failed: {:#}", e),
                };
                warn!("{}", err);
                None
            }
        }
    }

    /// Every URL requested from this catalog so far.
    pub fn requested_urls(&self) -> BTreeSet<String> {
        lock(&self.requested).clone()
    }

    /// The release index.
    pub fn index(&self) -> Result<Arc<ReleasesIndex>> {
        if let Some(index) = lock(&self.index).as_ref() {
            return Ok(Arc::clone(index));
        }

        let index: Arc<ReleasesIndex> = Arc::new(self.load_document(&self.index_url)?);
        *lock(&self.index) = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Channels with a numeric `major.minor`, highest first.
    pub fn channels(&self) -> Result<Vec<ReleaseChannel>> {
        let index = self.index()?;
        let mut channels: Vec<ReleaseChannel> = index
            .channels
            .iter()
            .filter(|c| c.version_key().is_some())
            .cloned()
            .collect();
        channels.sort_by(|a, b| b.version_key().cmp(&a.version_key()));
        Ok(channels)
    }

    /// Look up one channel by its `major.minor` string.
    pub fn channel(&self, channel_version: &str) -> Result<Option<ReleaseChannel>> {
        let index = self.index()?;
        Ok(index
            .channels
            .iter()
            .find(|c| c.channel_version == channel_version)
            .cloned())
    }

    /// Fetch a channel's manifest by its `major.minor` string.
    ///
    /// Returns `None` when the index does not list the channel.
    pub fn fetch_channel(&self, channel_version: &str) -> Result<Option<Arc<ReleaseManifest>>> {
        match self.channel(channel_version)? {
            Some(channel) => self.fetch_manifest(&channel).map(Some),
            None => Ok(None),
        }
    }

    /// Fetch the manifest of an index entry.
    pub fn fetch_manifest(&self, channel: &ReleaseChannel) -> Result<Arc<ReleaseManifest>> {
        let url = self.manifest_url(channel)?;

        if let Some(manifest) = lock(&self.manifests).get(&url) {
            return Ok(Arc::clone(manifest));
        }

        let manifest: Arc<ReleaseManifest> = Arc::new(self.load_document(&url)?);
        lock(&self.manifests).insert(url, Arc::clone(&manifest));
        Ok(manifest)
    }

    fn manifest_url(&self, channel: &ReleaseChannel) -> Result<String> {
        let base =
            reqwest::Url::parse(&self.index_url).map_err(|e| PlanError::MalformedManifest {
                url: self.index_url.clone(),
                message: format!("invalid index URL: {}", e),
            })?;

        base.join(&channel.releases_json)
            .map(String::from)
            .map_err(|e| PlanError::MalformedManifest {
                url: self.index_url.clone(),
                message: format!(
                    "invalid releases.json URL for channel {}: {}",
                    channel.channel_version, e
                ),
            })
    }

    /// Serve a document from the fresh disk cache, or fetch and cache it.
    fn load_document<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        lock(&self.requested).insert(url.to_string());

        if let Some(store) = &self.store {
            if let Some(content) = CacheValidator::new(store).fresh_content(url) {
                match serde_json::from_str::<T>(&content) {
                    Ok(document) => {
                        debug!("Catalog cache hit for {}", url);
                        return Ok(document);
                    }
                    Err(e) => debug!("Ignoring malformed cached copy of {}: {}", url, e),
                }
            }
        }

        debug!("Fetching {}", url);
        let body = self.fetcher.fetch(url)?;
        let document =
            serde_json::from_str::<T>(&body).map_err(|e| PlanError::MalformedManifest {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if let Some(store) = &self.store {
            if let Err(e) = store.store(url, &body, self.ttl_secs) {
                warn!("Failed to cache {}: {:#}", url, e);
            }
        }

        Ok(document)
    }
}
