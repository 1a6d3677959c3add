//! Durable artifact cache used to carry the catalog cache across runs.
//!
//! The transport behind [`ArtifactCache`] lives outside this crate; the
//! engine only decides which paths to persist and under which key.
//! [`DirectoryArtifactCache`] keeps each key as a directory on local disk.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Prefix shared by every durable catalog cache key.
pub const DURABLE_KEY_PREFIX: &str = "dotnet-releases";

/// Width of the time window baked into durable keys (12 hours).
pub const KEY_WINDOW_SECS: i64 = 12 * 60 * 60;

/// Outcome of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new entry was written.
    Saved,
    /// An entry already existed under the key and was left untouched.
    AlreadyExists,
}

/// A key-value store for directories.
pub trait ArtifactCache: Send + Sync {
    /// Restore `paths` from the first key that matches, exactly or as a prefix.
    ///
    /// Returns the key that was restored, or `None` on a miss.
    fn restore(&self, paths: &[PathBuf], keys: &[String]) -> Result<Option<String>>;

    /// Save `paths` under `key`.
    fn save(&self, paths: &[PathBuf], key: &str) -> Result<SaveOutcome>;
}

/// The time window a timestamp falls into.
pub fn key_window(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(KEY_WINDOW_SECS)
}

/// Restore prefix matching any key written in the current window.
pub fn restore_prefix(now: DateTime<Utc>) -> String {
    format!("{}-{}-", DURABLE_KEY_PREFIX, key_window(now))
}

/// Key for the set of URLs fetched during a run.
///
/// Independent of fetch order; changes when the URL set or the window changes.
pub fn durable_key(urls: &BTreeSet<String>, now: DateTime<Utc>) -> String {
    let joined = urls.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
    let hash = hex::encode(Sha256::digest(joined.as_bytes()));
    format!("{}{}", restore_prefix(now), &hash[..16])
}

/// Stores each key as `<root>/<key>/<n>` where `n` is the index of the path.
#[derive(Debug, Clone)]
pub struct DirectoryArtifactCache {
    root: PathBuf,
}

impl DirectoryArtifactCache {
    /// Create a cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find(&self, key: &str) -> Result<Option<(String, PathBuf)>> {
        let exact = self.root.join(key);
        if exact.is_dir() {
            return Ok(Some((key.to_string(), exact)));
        }

        if !self.root.exists() {
            return Ok(None);
        }

        let mut best: Option<(SystemTime, String, PathBuf)> = None;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(key) || !entry.path().is_dir() {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            if best.as_ref().is_none_or(|(t, _, _)| modified > *t) {
                best = Some((modified, name, entry.path()));
            }
        }

        Ok(best.map(|(_, name, path)| (name, path)))
    }
}

impl ArtifactCache for DirectoryArtifactCache {
    fn restore(&self, paths: &[PathBuf], keys: &[String]) -> Result<Option<String>> {
        for key in keys {
            let Some((matched, dir)) = self.find(key)? else {
                continue;
            };

            for (index, path) in paths.iter().enumerate() {
                let source = dir.join(index.to_string());
                if source.is_dir() {
                    copy_dir(&source, path)
                        .with_context(|| format!("Failed to restore {:?} from {}", path, matched))?;
                }
            }
            return Ok(Some(matched));
        }

        Ok(None)
    }

    fn save(&self, paths: &[PathBuf], key: &str) -> Result<SaveOutcome> {
        if key.is_empty() || key.contains(['/', '\\']) {
            bail!("Invalid cache key: {:?}", key);
        }

        let target = self.root.join(key);
        if target.exists() {
            return Ok(SaveOutcome::AlreadyExists);
        }

        let staging = self.root.join(format!(".staging-{}", key));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }

        for (index, path) in paths.iter().enumerate() {
            if path.is_dir() {
                copy_dir(path, &staging.join(index.to_string()))
                    .with_context(|| format!("Failed to save {:?} under {}", path, key))?;
            }
        }
        fs::create_dir_all(&staging)?;

        // Another writer may have landed the same key meanwhile.
        if target.exists() {
            fs::remove_dir_all(&staging)?;
            return Ok(SaveOutcome::AlreadyExists);
        }
        fs::rename(&staging, &target)?;

        Ok(SaveOutcome::Saved)
    }
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
