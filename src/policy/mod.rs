//! Turning a `global.json` pin into an SDK version request.
//!
//! The roll-forward policy decides how far the pinned version may float:
//!
//! | policy          | request              |
//! |-----------------|----------------------|
//! | absent/disable  | exact `8.0.100`      |
//! | `latestPatch`   | feature band `8.0.1xx` |
//! | `latestFeature` | channel `8.0.x`      |
//! | `latestMinor`   | major `8.x.x`        |
//! | `latestMajor`   | `latest`             |

use semver::Version;
use std::fmt;
use tracing::warn;

use crate::config::GlobalJson;
use crate::error::{PlanError, Result};
use crate::version::{Anchor, ArtifactType, Keyword, VersionRequest, VersionSpecifier};

/// How far a pinned SDK version may roll forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RollForward {
    /// Use the pinned version exactly.
    #[default]
    Disable,
    /// Highest patch within the pinned feature band.
    LatestPatch,
    /// Highest feature band and patch within the pinned channel.
    LatestFeature,
    /// Highest minor within the pinned major.
    LatestMinor,
    /// Highest version available.
    LatestMajor,
}

impl RollForward {
    /// Parse a policy name; `None` for names this engine does not honor.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "disable" => Some(Self::Disable),
            "latestpatch" => Some(Self::LatestPatch),
            "latestfeature" => Some(Self::LatestFeature),
            "latestminor" => Some(Self::LatestMinor),
            "latestmajor" => Some(Self::LatestMajor),
            _ => None,
        }
    }
}

impl fmt::Display for RollForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disable => "disable",
            Self::LatestPatch => "latestPatch",
            Self::LatestFeature => "latestFeature",
            Self::LatestMinor => "latestMinor",
            Self::LatestMajor => "latestMajor",
        };
        f.write_str(name)
    }
}

/// A validated pin from `global.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalJsonPolicy {
    pub base_version: Version,
    pub roll_forward: RollForward,
    pub allow_prerelease: bool,
}

impl GlobalJsonPolicy {
    /// Validate the `sdk` section of a parsed `global.json`.
    ///
    /// An unknown `rollForward` degrades to an exact pin with a warning.
    pub fn from_global_json(global: &GlobalJson) -> Result<Self> {
        let sdk = global
            .sdk
            .as_ref()
            .ok_or_else(|| PlanError::MalformedPolicyConfig {
                message: "missing `sdk` section".to_string(),
            })?;

        let raw = sdk
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PlanError::MalformedPolicyConfig {
                message: "missing `sdk.version`".to_string(),
            })?;

        let base_version = Version::parse(raw).map_err(|e| PlanError::MalformedPolicyConfig {
            message: format!("invalid `sdk.version` '{}': {}", raw, e),
        })?;

        let roll_forward = match sdk.roll_forward.as_deref() {
            None => RollForward::Disable,
            Some(name) => RollForward::from_name(name).unwrap_or_else(|| {
                warn!(
                    "Unrecognized rollForward '{}' in global.json, pinning SDK {} exactly",
                    name, base_version
                );
                RollForward::Disable
            }),
        };

        Ok(Self {
            base_version,
            roll_forward,
            allow_prerelease: sdk.allow_prerelease.unwrap_or(false),
        })
    }

    /// The specifier this policy resolves through.
    pub fn specifier(&self) -> VersionSpecifier {
        let Version {
            major,
            minor,
            patch,
            ..
        } = self.base_version;

        match self.roll_forward {
            RollForward::Disable => VersionSpecifier::Exact(self.base_version.clone()),
            RollForward::LatestPatch => VersionSpecifier::Wildcard(Anchor::FeatureBand {
                major,
                minor,
                band: patch / 100,
            }),
            RollForward::LatestFeature => {
                VersionSpecifier::Wildcard(Anchor::Channel { major, minor })
            }
            RollForward::LatestMinor => VersionSpecifier::Wildcard(Anchor::Major(major)),
            RollForward::LatestMajor => VersionSpecifier::Keyword(Keyword::Latest),
        }
    }

    /// The SDK request handed to the resolver.
    pub fn to_request(&self) -> VersionRequest {
        VersionRequest::new(
            self.specifier().to_string(),
            ArtifactType::Sdk,
            self.allow_prerelease,
        )
    }
}

/// Converts `global.json` into an SDK [`VersionRequest`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalJsonPolicyResolver;

impl GlobalJsonPolicyResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Produce the SDK request for a parsed `global.json`.
    pub fn resolve(&self, global: &GlobalJson) -> Result<VersionRequest> {
        let policy = GlobalJsonPolicy::from_global_json(global)?;
        let request = policy.to_request();
        tracing::debug!(
            "global.json pins SDK {} with rollForward {} -> '{}'",
            policy.base_version,
            policy.roll_forward,
            request.raw
        );
        Ok(request)
    }
}
