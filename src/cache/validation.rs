//! Deciding whether a cached catalog document may be served.

use anyhow::{bail, Context, Result};
use chrono::Duration;
use tracing::debug;

use super::entry::CacheEntry;
use super::CacheStore;

/// Where a URL stands in the disk cache.
#[derive(Debug, Clone)]
pub enum Freshness {
    Fresh(CacheEntry),
    Stale(CacheEntry),
    /// Never fetched, or its metadata could not be read.
    Missing,
}

/// Freshness checks over a [`CacheStore`].
pub struct CacheValidator<'a> {
    store: &'a CacheStore,
}

impl<'a> CacheValidator<'a> {
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    pub fn check(&self, url: &str) -> Freshness {
        match self.store.load(url) {
            Ok(Some(entry)) if entry.is_stale() => Freshness::Stale(entry),
            Ok(Some(entry)) => Freshness::Fresh(entry),
            Ok(None) => Freshness::Missing,
            Err(e) => {
                debug!("Treating unreadable cache metadata for {} as a miss: {:#}", url, e);
                Freshness::Missing
            }
        }
    }

    /// Cached body of `url` if it is still within its freshness window.
    ///
    /// A missing content file counts as a miss, never an error.
    pub fn fresh_content(&self, url: &str) -> Option<String> {
        match self.check(url) {
            Freshness::Fresh(entry) => match self.store.read_content(&entry) {
                Ok(content) => Some(content),
                Err(e) => {
                    debug!("Cached {} is unreadable: {:#}", entry.document, e);
                    None
                }
            },
            Freshness::Stale(entry) => {
                debug!(
                    "Cached {} is stale ({} old), refetching",
                    entry.document,
                    format_duration(entry.age())
                );
                None
            }
            Freshness::Missing => None,
        }
    }

    /// Delete every stale document and return how many went.
    pub fn purge_stale(&self) -> Result<usize> {
        let mut purged = 0;
        for entry in self.store.list()? {
            if entry.is_stale() && self.store.remove(&entry.url)? {
                debug!("Purged stale {} ({})", entry.document, entry.url);
                purged += 1;
            }
        }
        Ok(purged)
    }
}

/// Parse a freshness window such as `12h`, `30m`, `2d` or bare seconds.
pub fn parse_ttl(ttl: &str) -> Result<Duration> {
    let ttl = ttl.trim();
    if ttl.is_empty() {
        bail!("empty duration");
    }

    let split = ttl
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(ttl.len());
    let (amount, unit) = ttl.split_at(split);
    if amount.is_empty() {
        bail!("expected a number followed by s, m, h or d");
    }

    let amount: i64 = amount
        .parse()
        .with_context(|| format!("'{}' is out of range", amount))?;
    let seconds_per_unit = match unit.to_ascii_lowercase().as_str() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        other => bail!("unknown unit '{}' (use s, m, h or d)", other),
    };

    amount
        .checked_mul(seconds_per_unit)
        .and_then(Duration::try_seconds)
        .with_context(|| format!("'{}' is too long", ttl))
}

/// Render a duration in its largest whole unit.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds();
    match secs {
        s if s >= 86_400 => format!("{}d", s / 86_400),
        s if s >= 3_600 => format!("{}h", s / 3_600),
        s if s >= 60 => format!("{}m", s / 60),
        s => format!("{}s", s),
    }
}
