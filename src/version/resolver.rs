//! Resolving specifiers against the release catalog.

use semver::Version;
use tracing::debug;

use super::specifier::{Anchor, Keyword, VersionRequest, VersionSpecifier};
use super::{format_version, ArtifactType};
use crate::catalog::{ReleaseCatalog, ReleaseChannel, ReleaseManifest, ReleaseType};
use crate::error::{PlanError, Result};

/// Resolves version specifiers to concrete versions.
///
/// Resolution is a pure function of the catalog contents: the same
/// request against the same catalog always yields the same version.
pub struct VersionResolver<'a> {
    catalog: &'a ReleaseCatalog,
}

/// Labels a resolution so errors can name what was asked for.
struct Target<'r> {
    raw: &'r str,
    artifact: ArtifactType,
    allow_prerelease: bool,
}

impl Target<'_> {
    fn channel_not_found(&self) -> PlanError {
        PlanError::ChannelNotFound {
            specifier: self.raw.to_string(),
            artifact: self.artifact,
        }
    }

    fn no_matching_release(&self) -> PlanError {
        PlanError::NoMatchingRelease {
            specifier: self.raw.to_string(),
            artifact: self.artifact,
            allow_prerelease: self.allow_prerelease,
        }
    }

    /// Attach the specifier and type to catalog failures.
    fn with_context(&self, err: PlanError) -> PlanError {
        match err {
            PlanError::MalformedManifest { .. } | PlanError::NetworkFailure { .. } => {
                PlanError::Resolution {
                    specifier: self.raw.to_string(),
                    artifact: self.artifact,
                    source: Box::new(err),
                }
            }
            other => other,
        }
    }

    /// Highest admissible version of the target type in a manifest.
    fn best_in(
        &self,
        manifest: &ReleaseManifest,
        admits: impl Fn(&Version) -> bool,
    ) -> Option<Version> {
        manifest
            .versions(self.artifact)
            .into_iter()
            .filter(|v| self.allow_prerelease || v.pre.is_empty())
            .filter(|v| admits(v))
            .max()
    }
}

impl<'a> VersionResolver<'a> {
    /// Create a resolver reading from `catalog`.
    pub fn new(catalog: &'a ReleaseCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve a request.
    pub fn resolve(&self, request: &VersionRequest) -> Result<Version> {
        self.resolve_version(&request.raw, request.artifact, request.allow_prerelease)
    }

    /// Resolve a raw specifier for one artifact type.
    pub fn resolve_version(
        &self,
        specifier: &str,
        artifact: ArtifactType,
        allow_prerelease: bool,
    ) -> Result<Version> {
        let parsed = VersionSpecifier::parse(specifier, artifact)?;
        let target = Target {
            raw: specifier,
            artifact,
            allow_prerelease,
        };

        let version = match parsed {
            VersionSpecifier::Exact(version) => version,
            VersionSpecifier::Wildcard(anchor) => self
                .resolve_wildcard(&target, anchor)
                .map_err(|e| target.with_context(e))?,
            VersionSpecifier::Keyword(keyword) => self
                .resolve_keyword(&target, keyword)
                .map_err(|e| target.with_context(e))?,
        };

        debug!(
            "Resolved {} '{}' to {}",
            artifact,
            specifier,
            format_version(&version)
        );
        Ok(version)
    }

    fn resolve_wildcard(&self, target: &Target<'_>, anchor: Anchor) -> Result<Version> {
        match anchor.channel() {
            Some(channel_version) => {
                let channel = self
                    .catalog
                    .channel(&channel_version)?
                    .ok_or_else(|| target.channel_not_found())?;
                let manifest = self.catalog.fetch_manifest(&channel)?;

                target
                    .best_in(&manifest, |v| anchor.admits(v))
                    .ok_or_else(|| target.no_matching_release())
            }
            None => {
                let channels: Vec<ReleaseChannel> = self
                    .catalog
                    .channels()?
                    .into_iter()
                    .filter(|c| c.version_key().is_some_and(|(major, _)| major == anchor.major()))
                    .collect();
                self.highest_across(target, &channels)
            }
        }
    }

    fn resolve_keyword(&self, target: &Target<'_>, keyword: Keyword) -> Result<Version> {
        let channels: Vec<ReleaseChannel> = self
            .catalog
            .channels()?
            .into_iter()
            .filter(|c| match keyword {
                Keyword::Latest => c.is_active(),
                Keyword::Lts => c.release_type == ReleaseType::Lts,
                Keyword::Sts => c.release_type == ReleaseType::Sts,
            })
            .collect();
        self.highest_across(target, &channels)
    }

    /// Walk channels highest first and stop at the first with a candidate.
    ///
    /// `channels` must be sorted by descending channel version. Each candidate
    /// is pinned to its channel's major.minor, so the first hit is the
    /// global maximum.
    fn highest_across(&self, target: &Target<'_>, channels: &[ReleaseChannel]) -> Result<Version> {
        if channels.is_empty() {
            return Err(target.channel_not_found());
        }

        for channel in channels {
            let Some((major, minor)) = channel.version_key() else {
                continue;
            };
            let manifest = self.catalog.fetch_manifest(channel)?;
            if let Some(version) =
                target.best_in(&manifest, |v| v.major == major && v.minor == minor)
            {
                return Ok(version);
            }
            debug!(
                "Channel {} has no {} candidate for '{}'",
                channel.channel_version, target.artifact, target.raw
            );
        }

        Err(target.no_matching_release())
    }
}
