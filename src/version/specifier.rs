//! Version specifier parsing.
//!
//! Raw request strings are parsed once into a [`VersionSpecifier`] so the
//! rest of the pipeline never re-inspects string contents.

use regex::Regex;
use semver::Version;
use std::fmt;
use std::sync::LazyLock;

use super::{format_version, parse_version, ArtifactType};
use crate::error::{PlanError, Result};

/// Wildcard forms: `10`, `10.x`, `10.x.x`, `8.0`, `8.0.x`, `8.0.1xx`.
static WILDCARD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<major>\d+)(?:\.(?:(?P<minor>\d+)(?:\.(?:(?P<band>\d)xx|[x*]))?|[x*](?:\.[x*])?))?$",
    )
    .expect("WILDCARD_REGEX must compile")
});

/// Release-line keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// Highest version across all active channels.
    Latest,
    /// Highest long-term support channel.
    Lts,
    /// Highest standard-term support channel.
    Sts,
}

/// The fixed leading positions of a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// `10.x.x`: every channel with this major.
    Major(u64),
    /// `8.0.x`: a single channel.
    Channel { major: u64, minor: u64 },
    /// `8.0.1xx`: one feature band inside a channel.
    FeatureBand { major: u64, minor: u64, band: u64 },
}

impl Anchor {
    /// Whether a concrete version falls under this anchor.
    pub fn admits(&self, version: &Version) -> bool {
        match *self {
            Anchor::Major(major) => version.major == major,
            Anchor::Channel { major, minor } => version.major == major && version.minor == minor,
            Anchor::FeatureBand { major, minor, band } => {
                version.major == major && version.minor == minor && version.patch / 100 == band
            }
        }
    }

    /// The `major.minor` channel this anchor pins, if it pins one.
    pub fn channel(&self) -> Option<String> {
        match *self {
            Anchor::Major(_) => None,
            Anchor::Channel { major, minor } | Anchor::FeatureBand { major, minor, .. } => {
                Some(format!("{}.{}", major, minor))
            }
        }
    }

    /// The anchored major version.
    pub fn major(&self) -> u64 {
        match *self {
            Anchor::Major(major)
            | Anchor::Channel { major, .. }
            | Anchor::FeatureBand { major, .. } => major,
        }
    }
}

/// A parsed version request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSpecifier {
    /// A concrete version, returned as-is.
    Exact(Version),
    /// Trailing wildcard positions, resolved against the catalog.
    Wildcard(Anchor),
    /// A release-line keyword.
    Keyword(Keyword),
}

impl VersionSpecifier {
    /// Parse a raw specifier string.
    ///
    /// The artifact type is only used to label the error.
    pub fn parse(raw: &str, artifact: ArtifactType) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = |message: &str| PlanError::InvalidSpecifier {
            specifier: raw.to_string(),
            artifact,
            message: message.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty specifier"));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "latest" => return Ok(Self::Keyword(Keyword::Latest)),
            "lts" => return Ok(Self::Keyword(Keyword::Lts)),
            "sts" => return Ok(Self::Keyword(Keyword::Sts)),
            _ => {}
        }

        if let Some(version) = parse_version(trimmed) {
            return Ok(Self::Exact(version));
        }

        let caps = WILDCARD_REGEX.captures(trimmed).ok_or_else(|| {
            invalid("expected an exact version, a trailing wildcard, or latest/lts/sts")
        })?;

        let number = |name: &str| -> Result<Option<u64>> {
            caps.name(name)
                .map(|m| m.as_str().parse::<u64>())
                .transpose()
                .map_err(|_| invalid("version component out of range"))
        };

        let major = number("major")?.ok_or_else(|| invalid("missing major version"))?;
        let anchor = match (number("minor")?, number("band")?) {
            (Some(minor), Some(band)) => Anchor::FeatureBand { major, minor, band },
            (Some(minor), None) => Anchor::Channel { major, minor },
            (None, _) => Anchor::Major(major),
        };

        Ok(Self::Wildcard(anchor))
    }

    /// Whether this specifier needs the catalog to resolve.
    pub fn needs_catalog(&self) -> bool {
        !matches!(self, Self::Exact(_))
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(version) => f.write_str(&format_version(version)),
            Self::Wildcard(Anchor::Major(major)) => write!(f, "{}.x.x", major),
            Self::Wildcard(Anchor::Channel { major, minor }) => write!(f, "{}.{}.x", major, minor),
            Self::Wildcard(Anchor::FeatureBand { major, minor, band }) => {
                write!(f, "{}.{}.{}xx", major, minor, band)
            }
            Self::Keyword(Keyword::Latest) => f.write_str("latest"),
            Self::Keyword(Keyword::Lts) => f.write_str("lts"),
            Self::Keyword(Keyword::Sts) => f.write_str("sts"),
        }
    }
}

/// One request for one artifact type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequest {
    /// The specifier as the caller wrote it.
    pub raw: String,
    /// Which artifact the specifier targets.
    pub artifact: ArtifactType,
    /// Whether prerelease builds may be selected.
    pub allow_prerelease: bool,
}

impl VersionRequest {
    /// Create a request.
    pub fn new(raw: impl Into<String>, artifact: ArtifactType, allow_prerelease: bool) -> Self {
        Self {
            raw: raw.into(),
            artifact,
            allow_prerelease,
        }
    }

    /// Parse the raw string.
    pub fn specifier(&self) -> Result<VersionSpecifier> {
        VersionSpecifier::parse(&self.raw, self.artifact)
    }
}
