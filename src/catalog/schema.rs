//! Wire schema of the release catalog.
//!
//! Both documents are deserialized strictly: a missing required field or a
//! wrong type is a [`MalformedManifest`](crate::PlanError::MalformedManifest).
//! Unknown fields are ignored.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::version::{parse_version, ArtifactType};

/// The top-level release index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasesIndex {
    /// One entry per major.minor channel.
    #[serde(rename = "releases-index")]
    pub channels: Vec<ReleaseChannel>,
}

/// Support classification of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    /// Long-term support.
    Lts,
    /// Standard-term support (formerly "current").
    #[serde(alias = "current")]
    Sts,
}

/// Lifecycle phase of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupportPhase {
    Preview,
    GoLive,
    Active,
    Maintenance,
    Eol,
    #[serde(other)]
    Unknown,
}

/// One channel entry in the release index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseChannel {
    /// `major.minor`, e.g. `8.0`.
    pub channel_version: String,
    pub latest_release: String,
    #[serde(default)]
    pub latest_runtime: Option<String>,
    pub latest_sdk: String,
    pub release_type: ReleaseType,
    pub support_phase: SupportPhase,
    /// URL of the channel's release manifest.
    #[serde(rename = "releases.json")]
    pub releases_json: String,
}

impl ReleaseChannel {
    /// Numeric `(major, minor)` of the channel, if it parses.
    pub fn version_key(&self) -> Option<(u64, u64)> {
        let (major, minor) = self.channel_version.split_once('.')?;
        Some((major.parse().ok()?, minor.parse().ok()?))
    }

    /// Whether the channel is still supported.
    pub fn is_active(&self) -> bool {
        self.support_phase != SupportPhase::Eol
    }
}

/// A channel's release manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseManifest {
    pub channel_version: String,
    pub releases: Vec<Release>,
}

/// Artifacts shipped together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    pub release_version: String,
    #[serde(default)]
    pub sdk: Option<Artifact>,
    #[serde(default)]
    pub sdks: Vec<Artifact>,
    #[serde(default)]
    pub runtime: Option<Artifact>,
    #[serde(default)]
    pub aspnetcore_runtime: Option<Artifact>,
}

/// One artifact of a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub version: String,
    #[serde(default)]
    pub files: Vec<ArtifactFile>,
}

/// A downloadable file of an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub name: String,
    #[serde(default)]
    pub rid: Option<String>,
    pub url: String,
    #[serde(default)]
    pub hash: Option<String>,
}

fn present(artifact: &Option<Artifact>) -> Option<&str> {
    artifact
        .as_ref()
        .map(|a| a.version.trim())
        .filter(|v| !v.is_empty())
}

impl Release {
    /// Every version string of the given type in this release.
    pub fn versions(&self, artifact: ArtifactType) -> Vec<&str> {
        match artifact {
            ArtifactType::Sdk => {
                let mut versions: Vec<&str> = self
                    .sdks
                    .iter()
                    .map(|a| a.version.trim())
                    .filter(|v| !v.is_empty())
                    .collect();
                if let Some(sdk) = present(&self.sdk) {
                    if !versions.contains(&sdk) {
                        versions.push(sdk);
                    }
                }
                versions
            }
            ArtifactType::Runtime => present(&self.runtime).into_iter().collect(),
            ArtifactType::AspNetCore => present(&self.aspnetcore_runtime).into_iter().collect(),
        }
    }

    /// Whether this release ships the given SDK version.
    pub fn ships_sdk(&self, version: &str) -> bool {
        self.versions(ArtifactType::Sdk).contains(&version)
    }

    /// The bundled runtime version.
    pub fn runtime_version(&self) -> Option<&str> {
        present(&self.runtime)
    }

    /// The bundled ASP.NET Core runtime version.
    pub fn aspnetcore_version(&self) -> Option<&str> {
        present(&self.aspnetcore_runtime)
    }
}

impl ReleaseManifest {
    /// Every parseable version of the given type across all releases.
    ///
    /// Unparseable version strings are skipped.
    pub fn versions(&self, artifact: ArtifactType) -> Vec<Version> {
        self.releases
            .iter()
            .flat_map(|release| release.versions(artifact))
            .filter_map(|raw| {
                let parsed = parse_version(raw);
                if parsed.is_none() {
                    tracing::debug!(
                        "Skipping unparseable {} version '{}' in channel {}",
                        artifact,
                        raw,
                        self.channel_version
                    );
                }
                parsed
            })
            .collect()
    }

    /// The release that ships the given SDK version.
    pub fn release_for_sdk(&self, version: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.ships_sdk(version))
    }
}
