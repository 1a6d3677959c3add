//! Engine settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::default_cache_dir;

/// Official .NET release metadata index.
pub const DEFAULT_INDEX_URL: &str =
    "https://builds.dotnet.microsoft.com/dotnet/release-metadata/releases-index.json";

/// Catalog freshness window (12 hours).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 12 * 60 * 60;

fn default_index_url() -> String {
    DEFAULT_INDEX_URL.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_true(b: &bool) -> bool {
    *b
}

fn default_true() -> bool {
    true
}

/// Settings for one resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// URL of the release index document.
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Directory for the local freshness cache.
    pub cache_dir: PathBuf,

    /// Freshness window for cached documents.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Use the on-disk and durable caches.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub cache_enabled: bool,

    /// Default prerelease policy for command-line specifiers.
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_prerelease: bool,

    /// Explicit global.json to read instead of none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_json: Option<PathBuf>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            cache_dir: default_cache_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_enabled: true,
            allow_prerelease: false,
            global_json: None,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Point the engine at a different release index.
    pub fn with_index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = url.into();
        self
    }

    /// Use a different cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Change the freshness window.
    pub fn with_cache_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.cache_ttl_secs = ttl.num_seconds().max(0) as u64;
        self
    }

    /// Enable or disable caching.
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// HTTP timeout as a [`Duration`].
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
