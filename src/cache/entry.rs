//! Metadata stored beside each cached catalog document.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which catalog document a cached URL holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Document {
    /// The top-level `releases-index.json`.
    Index,
    /// One channel's `releases.json`.
    Manifest { channel: String },
    /// A URL outside the usual catalog layout.
    Other,
}

impl Document {
    /// Classify a catalog URL by its trailing path segments.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let mut segments = path.rsplit('/');

        match (segments.next(), segments.next()) {
            (Some("releases-index.json"), _) => Document::Index,
            (Some("releases.json"), Some(channel)) if is_channel(channel) => Document::Manifest {
                channel: channel.to_string(),
            },
            _ => Document::Other,
        }
    }
}

fn is_channel(segment: &str) -> bool {
    segment
        .split_once('.')
        .is_some_and(|(major, minor)| {
            [major, minor]
                .iter()
                .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        })
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Index => f.write_str("release index"),
            Document::Manifest { channel } => write!(f, "{} manifest", channel),
            Document::Other => f.write_str("document"),
        }
    }
}

/// A catalog document on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// URL the document was fetched from; also the cache key.
    pub url: String,
    pub document: Document,
    pub content_path: PathBuf,
    pub metadata: CacheMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub fetched_at: DateTime<Utc>,
    /// The document is served from disk until this instant.
    pub fresh_until: DateTime<Utc>,
    pub size_bytes: u64,
}

impl CacheEntry {
    /// Record a document fetched just now.
    pub fn fetched(
        url: impl Into<String>,
        content_path: impl Into<PathBuf>,
        size_bytes: u64,
        ttl_seconds: u64,
    ) -> Self {
        let url = url.into();
        let fetched_at = Utc::now();
        let ttl = i64::try_from(ttl_seconds)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        let fresh_until = fetched_at
            .checked_add_signed(Duration::seconds(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            document: Document::from_url(&url),
            url,
            content_path: content_path.into(),
            metadata: CacheMetadata {
                fetched_at,
                fresh_until,
                size_bytes,
            },
        }
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    /// Stale from `fresh_until` onwards, so a zero TTL is never served.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.metadata.fresh_until
    }

    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.metadata.fetched_at)
    }

    /// Time left before a refetch; zero once stale.
    pub fn fresh_for(&self) -> Duration {
        self.metadata
            .fresh_until
            .signed_duration_since(Utc::now())
            .max(Duration::zero())
    }
}
