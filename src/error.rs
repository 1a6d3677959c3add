//! Error types for dotplan operations.
//!
//! This module defines [`PlanError`], the error type returned by the
//! resolution engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Resolution errors (`InvalidSpecifier`, `ChannelNotFound`,
//!   `NoMatchingRelease`, `MalformedManifest`, `MalformedPolicyConfig`)
//!   abort the whole batch
//! - Errors raised while resolving a specifier name it and its artifact
//!   type; catalog failures (`MalformedManifest`, `NetworkFailure`) get both
//!   from the `Resolution` wrapper
//! - `NetworkFailure` keeps the transport error as its source; nothing here retries
//! - `CacheUnavailable` is only ever logged by the catalog, never returned
//!   from `open`/`flush`

use thiserror::Error;

use crate::version::ArtifactType;

/// Core error type for dotplan operations.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The specifier string is not an exact version, wildcard, or keyword.
    #[error("Invalid {artifact} version specifier '{specifier}': {message}")]
    InvalidSpecifier {
        specifier: String,
        artifact: ArtifactType,
        message: String,
    },

    /// No channel in the release index matches the specifier's anchor.
    #[error("No release channel matches {artifact} specifier '{specifier}'")]
    ChannelNotFound {
        specifier: String,
        artifact: ArtifactType,
    },

    /// A channel was found but no release satisfies the constraints.
    #[error(
        "No {artifact} release matches '{specifier}' (prerelease allowed: {allow_prerelease})"
    )]
    NoMatchingRelease {
        specifier: String,
        artifact: ArtifactType,
        allow_prerelease: bool,
    },

    /// A fetched catalog document does not match the expected schema.
    #[error("Malformed release manifest at {url}: {message}")]
    MalformedManifest { url: String, message: String },

    /// A catalog failure hit while resolving one specifier.
    #[error("Failed to resolve {artifact} specifier '{specifier}': {source}")]
    Resolution {
        specifier: String,
        artifact: ArtifactType,
        #[source]
        source: Box<PlanError>,
    },

    /// The pinned-version configuration is unusable.
    #[error("Malformed global.json policy: {message}")]
    MalformedPolicyConfig { message: String },

    /// Transport-level failure talking to the release catalog.
    #[error("Failed to fetch {url}: {source}")]
    NetworkFailure {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The durable artifact cache could not be restored or saved.
    #[error("Durable cache unavailable: {message}")]
    CacheUnavailable { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlanError {
    /// Whether this error belongs to the resolution layer and must abort a batch.
    ///
    /// `Resolution` context is looked through, so a transport failure stays
    /// a transport failure.
    pub fn is_resolution_error(&self) -> bool {
        match self {
            Self::Resolution { source, .. } => source.is_resolution_error(),
            other => matches!(
                other,
                Self::InvalidSpecifier { .. }
                    | Self::ChannelNotFound { .. }
                    | Self::NoMatchingRelease { .. }
                    | Self::MalformedManifest { .. }
                    | Self::MalformedPolicyConfig { .. }
            ),
        }
    }

    /// The innermost error, looking through `Resolution` context.
    pub fn root_cause(&self) -> &PlanError {
        match self {
            Self::Resolution { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for dotplan operations.
pub type Result<T> = std::result::Result<T, PlanError>;
