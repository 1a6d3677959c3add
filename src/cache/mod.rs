//! Release catalog caching.
//!
//! This module provides the disk-based freshness cache for catalog documents
//! and the durable artifact cache that carries it across runs.

pub mod durable;
pub mod entry;
pub mod store;
pub mod validation;

pub use durable::{
    durable_key, restore_prefix, ArtifactCache, DirectoryArtifactCache, SaveOutcome,
};
pub use entry::{CacheEntry, CacheMetadata, Document};
pub use store::CacheStore;
pub use validation::{format_duration, parse_ttl, CacheValidator, Freshness};

/// Get the default cache directory.
pub fn default_cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("dotplan")
        .join("releases")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cache_dir_valid() {
        let path = default_cache_dir();
        assert!(path.ends_with("releases"));
    }
}
