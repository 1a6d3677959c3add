//! Configuration for the resolution engine.
//!
//! - [`engine`] - index URL, cache location and freshness, prerelease default
//! - [`global_json`] - the pinned-version file read from disk

pub mod engine;
pub mod global_json;

pub use engine::{EngineConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_INDEX_URL};
pub use global_json::{GlobalJson, SdkSection};
