//! Building minimal install plans.
//!
//! [`plan_install`] resolves every requested specifier against the
//! catalog, then hands the concrete versions to the [`Deduplicator`].
//!
//! - [`mapper`] - which runtimes an SDK ships with
//! - [`dedup`] - dropping entries another entry already provides
//! - [`cache_key`] - stable keys for a finished plan

pub mod cache_key;
pub mod dedup;
pub mod mapper;

pub use cache_key::generate_cache_key;
pub use dedup::{
    collapse, DedupOutcome, Deduplicator, DropReason, DropRule, ResolvedEntry, ResolvedRequests,
};
pub use mapper::{IncludedVersions, SdkRuntimeMapper};

use semver::Version;
use serde::{Deserialize, Serialize};
use std::thread;
use tracing::{debug, info};

use crate::catalog::ReleaseCatalog;
use crate::config::GlobalJson;
use crate::error::{PlanError, Result};
use crate::policy::GlobalJsonPolicyResolver;
use crate::version::{dotted, format_version, ArtifactType, VersionRequest, VersionResolver};

/// Concrete versions to install, one ordered list per artifact type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPlan {
    #[serde(with = "dotted::as_dotted_list")]
    pub sdk: Vec<Version>,
    #[serde(with = "dotted::as_dotted_list")]
    pub runtime: Vec<Version>,
    #[serde(with = "dotted::as_dotted_list")]
    pub aspnetcore: Vec<Version>,
}

/// One entry of an [`InstallPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPlanItem {
    #[serde(with = "dotted::as_dotted")]
    pub version: Version,
    #[serde(rename = "type")]
    pub artifact: ArtifactType,
}

impl InstallPlan {
    /// Versions of one type.
    pub fn get(&self, artifact: ArtifactType) -> &[Version] {
        match artifact {
            ArtifactType::Sdk => &self.sdk,
            ArtifactType::Runtime => &self.runtime,
            ArtifactType::AspNetCore => &self.aspnetcore,
        }
    }

    /// Append a version to its type's list.
    pub fn push(&mut self, artifact: ArtifactType, version: Version) {
        match artifact {
            ArtifactType::Sdk => self.sdk.push(version),
            ArtifactType::Runtime => self.runtime.push(version),
            ArtifactType::AspNetCore => self.aspnetcore.push(version),
        }
    }

    /// All entries, SDKs first.
    pub fn items(&self) -> impl Iterator<Item = InstallPlanItem> + '_ {
        ArtifactType::ALL.into_iter().flat_map(move |artifact| {
            self.get(artifact).iter().map(move |version| InstallPlanItem {
                version: version.clone(),
                artifact,
            })
        })
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.sdk.len() + self.runtime.len() + self.aspnetcore.len()
    }

    /// Whether nothing needs installing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the caller asked to install.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub sdk: Vec<String>,
    pub runtime: Vec<String>,
    pub aspnetcore: Vec<String>,
    /// Applies to the explicit specifiers; `global.json` carries its own flag.
    pub allow_prerelease: bool,
    /// Pinned SDK, resolved after the explicit SDK specifiers.
    pub global_json: Option<GlobalJson>,
}

impl InstallRequest {
    /// Every version request in resolution order.
    pub fn version_requests(&self) -> Result<Vec<VersionRequest>> {
        let mut requests = Vec::new();

        for (artifact, specifiers) in [
            (ArtifactType::Sdk, &self.sdk),
            (ArtifactType::Runtime, &self.runtime),
            (ArtifactType::AspNetCore, &self.aspnetcore),
        ] {
            requests.extend(
                specifiers
                    .iter()
                    .map(|raw| VersionRequest::new(raw.trim(), artifact, self.allow_prerelease)),
            );

            if artifact == ArtifactType::Sdk {
                if let Some(global) = &self.global_json {
                    requests.push(GlobalJsonPolicyResolver::new().resolve(global)?);
                }
            }
        }

        Ok(requests)
    }
}

/// Resolve and deduplicate a request into the minimal plan.
///
/// Specifiers resolve concurrently. The first failure in request order
/// aborts the batch and no partial plan is returned.
pub fn plan_install(catalog: &ReleaseCatalog, request: &InstallRequest) -> Result<DedupOutcome> {
    let requests = request.version_requests()?;
    let resolved = resolve_all(catalog, &requests)?;
    let outcome = Deduplicator::new(catalog).deduplicate(&resolved)?;

    info!(
        "Planned {} of {} requested artifacts ({} redundant)",
        outcome.plan.len(),
        requests.len(),
        outcome.dropped.len()
    );
    Ok(outcome)
}

/// Upper bound on concurrent resolver threads.
pub const MAX_RESOLVE_WORKERS: usize = 8;

/// Resolve requests on scoped threads, keeping request order.
///
/// Requests run in batches of at most [`MAX_RESOLVE_WORKERS`]; a failing
/// batch stops the remaining ones from starting.
pub fn resolve_all(catalog: &ReleaseCatalog, requests: &[VersionRequest]) -> Result<ResolvedRequests> {
    let resolver = &VersionResolver::new(catalog);
    let mut resolved = ResolvedRequests::default();

    for batch in requests.chunks(MAX_RESOLVE_WORKERS) {
        let results: Vec<Result<Version>> = thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|request| scope.spawn(move || resolver.resolve(request)))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(PlanError::Other(anyhow::anyhow!("resolver thread panicked")))
                    })
                })
                .collect()
        });

        for (request, result) in batch.iter().zip(results) {
            let version = result?;
            debug!(
                "{} '{}' -> {}",
                request.artifact,
                request.raw,
                format_version(&version)
            );
            resolved.push(request.artifact, ResolvedEntry::new(request.raw.clone(), version));
        }
    }

    Ok(resolved)
}
