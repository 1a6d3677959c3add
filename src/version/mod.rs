//! Version specifiers and their resolution.
//!
//! - [`dotted`] - parsing and printing versions with four or more components
//! - [`specifier`] - parsing raw request strings into [`VersionSpecifier`]
//! - [`resolver`] - resolving a specifier to a concrete version via the catalog

pub mod dotted;
pub mod resolver;
pub mod specifier;

pub use dotted::{format_version, parse_version};
pub use resolver::VersionResolver;
pub use specifier::{Anchor, Keyword, VersionRequest, VersionSpecifier};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three installable artifact types, in bundling order.
///
/// An SDK ships a runtime and an ASP.NET Core runtime; the ASP.NET Core
/// runtime ships a runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// The full SDK.
    Sdk,
    /// The base runtime.
    Runtime,
    /// The ASP.NET Core runtime.
    #[value(name = "aspnetcore")]
    AspNetCore,
}

impl ArtifactType {
    /// All artifact types, SDK first.
    pub const ALL: [ArtifactType; 3] = [
        ArtifactType::Sdk,
        ArtifactType::Runtime,
        ArtifactType::AspNetCore,
    ];

    /// Lowercase identifier used in keys and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Sdk => "sdk",
            ArtifactType::Runtime => "runtime",
            ArtifactType::AspNetCore => "aspnetcore",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sdk" => Ok(ArtifactType::Sdk),
            "runtime" => Ok(ArtifactType::Runtime),
            "aspnetcore" | "aspnetcore-runtime" => Ok(ArtifactType::AspNetCore),
            other => Err(format!("unknown artifact type: {}", other)),
        }
    }
}
