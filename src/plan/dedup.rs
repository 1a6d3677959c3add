//! Removing plan entries that another entry already provides.
//!
//! Precedence is `sdk > aspnetcore > runtime`:
//! - a runtime is dropped if an SDK bundles it, or if an SDK or ASP.NET Core
//!   entry resolved to the same version
//! - an ASP.NET Core runtime is dropped if an SDK bundles it or an SDK
//!   entry resolved to the same version
//! - SDKs are only collapsed against each other
//!
//! Duplicates within a type keep their first occurrence.

use semver::Version;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

use super::mapper::{IncludedVersions, SdkRuntimeMapper};
use super::InstallPlan;
use crate::catalog::ReleaseCatalog;
use crate::error::Result;
use crate::version::{dotted, format_version, ArtifactType};

/// A specifier paired with the version it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub specifier: String,
    #[serde(with = "dotted::as_dotted")]
    pub version: Version,
}

impl ResolvedEntry {
    /// Pair a specifier with its resolution.
    pub fn new(specifier: impl Into<String>, version: Version) -> Self {
        Self {
            specifier: specifier.into(),
            version,
        }
    }
}

/// Resolved entries per artifact type, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedRequests {
    pub sdk: Vec<ResolvedEntry>,
    pub runtime: Vec<ResolvedEntry>,
    pub aspnetcore: Vec<ResolvedEntry>,
}

impl ResolvedRequests {
    /// Entries of one type.
    pub fn get(&self, artifact: ArtifactType) -> &[ResolvedEntry] {
        match artifact {
            ArtifactType::Sdk => &self.sdk,
            ArtifactType::Runtime => &self.runtime,
            ArtifactType::AspNetCore => &self.aspnetcore,
        }
    }

    /// Append an entry to its type's list.
    pub fn push(&mut self, artifact: ArtifactType, entry: ResolvedEntry) {
        match artifact {
            ArtifactType::Sdk => self.sdk.push(entry),
            ArtifactType::Runtime => self.runtime.push(entry),
            ArtifactType::AspNetCore => self.aspnetcore.push(entry),
        }
    }

    /// Treat a plan's concrete versions as already-resolved requests.
    pub fn from_plan(plan: &InstallPlan) -> Self {
        let mut requests = Self::default();
        for artifact in ArtifactType::ALL {
            for version in plan.get(artifact) {
                requests.push(artifact, ResolvedEntry::new(format_version(version), version.clone()));
            }
        }
        requests
    }
}

/// Which rule removed an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropRule {
    /// An earlier entry of the same type resolved to the same version.
    DuplicateWithinType,
    /// A requested SDK ships this runtime.
    BundledWithSdk,
    /// A requested SDK resolved to the same version.
    CoveredBySdk,
    /// A requested ASP.NET Core runtime resolved to the same version.
    CoveredByAspNetCore,
}

impl fmt::Display for DropRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropRule::DuplicateWithinType => "duplicate within type",
            DropRule::BundledWithSdk => "bundled with sdk",
            DropRule::CoveredBySdk => "same version as sdk",
            DropRule::CoveredByAspNetCore => "same version as aspnetcore",
        };
        f.write_str(text)
    }
}

/// Why an entry left the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropReason {
    pub artifact: ArtifactType,
    pub specifier: String,
    #[serde(with = "dotted::as_dotted")]
    pub version: Version,
    pub rule: DropRule,
    /// The entry that made this one redundant, e.g. `sdk 8.0.100`.
    pub covered_by: String,
}

/// The minimal plan plus a record of every removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupOutcome {
    pub plan: InstallPlan,
    pub dropped: Vec<DropReason>,
}

/// Eliminates redundant entries using SDK bundling information.
pub struct Deduplicator<'a> {
    catalog: &'a ReleaseCatalog,
}

impl<'a> Deduplicator<'a> {
    /// Create a deduplicator reading bundling info from `catalog`.
    pub fn new(catalog: &'a ReleaseCatalog) -> Self {
        Self { catalog }
    }

    /// Collapse resolved requests into the minimal plan.
    pub fn deduplicate(&self, requests: &ResolvedRequests) -> Result<DedupOutcome> {
        let mapper = SdkRuntimeMapper::new(self.catalog);
        let mut bundled = Vec::with_capacity(requests.sdk.len());
        let mut seen = HashSet::new();

        for entry in &requests.sdk {
            if seen.insert(&entry.version) {
                let included = mapper.get_sdk_included_versions(&entry.version)?;
                bundled.push((entry.version.clone(), included));
            }
        }

        Ok(collapse(requests, &bundled))
    }
}

/// Apply the precedence rules given each SDK's bundled runtimes.
///
/// Pure: the result depends only on the arguments.
pub fn collapse(
    requests: &ResolvedRequests,
    bundled: &[(Version, IncludedVersions)],
) -> DedupOutcome {
    // Runtime and ASP.NET Core bundles share one set: the same SDK fact excludes both.
    let mut sdk_included: HashMap<&Version, &Version> = HashMap::new();
    for (sdk, included) in bundled {
        for version in [&included.runtime, &included.aspnetcore].into_iter().flatten() {
            sdk_included.entry(version).or_insert(sdk);
        }
    }

    let sdk_set = first_specifiers(&requests.sdk);
    let aspnetcore_set = first_specifiers(&requests.aspnetcore);

    let mut outcome = DedupOutcome::default();

    for artifact in ArtifactType::ALL {
        let mut kept: HashMap<&Version, &str> = HashMap::new();

        for entry in requests.get(artifact) {
            let cover = match artifact {
                ArtifactType::Sdk => None,
                ArtifactType::Runtime => covering(
                    &entry.version,
                    &sdk_included,
                    &sdk_set,
                    Some(&aspnetcore_set),
                ),
                ArtifactType::AspNetCore => {
                    covering(&entry.version, &sdk_included, &sdk_set, None)
                }
            };

            let dropped = cover.or_else(|| {
                kept.get(&entry.version).map(|first| {
                    (
                        DropRule::DuplicateWithinType,
                        format!("{} {}", artifact, first),
                    )
                })
            });

            match dropped {
                Some((rule, covered_by)) => {
                    debug!(
                        "Dropping {} '{}' ({}): {} [{}]",
                        artifact,
                        entry.specifier,
                        format_version(&entry.version),
                        rule,
                        covered_by
                    );
                    outcome.dropped.push(DropReason {
                        artifact,
                        specifier: entry.specifier.clone(),
                        version: entry.version.clone(),
                        rule,
                        covered_by,
                    });
                }
                None => {
                    kept.insert(&entry.version, &entry.specifier);
                    outcome.plan.push(artifact, entry.version.clone());
                }
            }
        }
    }

    outcome
}

fn first_specifiers(entries: &[ResolvedEntry]) -> HashMap<&Version, &str> {
    let mut set = HashMap::new();
    for entry in entries {
        set.entry(&entry.version).or_insert(entry.specifier.as_str());
    }
    set
}

fn covering(
    version: &Version,
    sdk_included: &HashMap<&Version, &Version>,
    sdk_set: &HashMap<&Version, &str>,
    aspnetcore_set: Option<&HashMap<&Version, &str>>,
) -> Option<(DropRule, String)> {
    if let Some(sdk) = sdk_included.get(version) {
        return Some((DropRule::BundledWithSdk, format!("sdk {}", format_version(sdk))));
    }
    if let Some(spec) = sdk_set.get(version) {
        return Some((DropRule::CoveredBySdk, format!("sdk {}", spec)));
    }
    aspnetcore_set
        .and_then(|set| set.get(version))
        .map(|spec| (DropRule::CoveredByAspNetCore, format!("aspnetcore {}", spec)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        crate::version::parse_version(s).unwrap()
    }

    fn entries(items: &[(&str, &str)]) -> Vec<ResolvedEntry> {
        items
            .iter()
            .map(|(spec, version)| ResolvedEntry::new(*spec, v(version)))
            .collect()
    }

    fn versions(list: &[Version]) -> Vec<String> {
        list.iter().map(format_version).collect()
    }

    #[test]
    fn runtime_matching_sdk_version_is_dropped() {
        let requests = ResolvedRequests {
            sdk: entries(&[("8.0.100", "8.0.100")]),
            runtime: entries(&[("8.0.100", "8.0.100")]),
            aspnetcore: vec![],
        };

        let outcome = collapse(&requests, &[]);

        assert_eq!(versions(&outcome.plan.sdk), vec!["8.0.100"]);
        assert!(outcome.plan.runtime.is_empty());
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].rule, DropRule::CoveredBySdk);
        assert_eq!(outcome.dropped[0].covered_by, "sdk 8.0.100");
    }

    #[test]
    fn fourth_component_keeps_versions_distinct() {
        let requests = ResolvedRequests {
            sdk: entries(&[("8.0.100.1", "8.0.100.1")]),
            runtime: entries(&[("8.0.100", "8.0.100")]),
            aspnetcore: vec![],
        };

        let outcome = collapse(&requests, &[]);

        assert_eq!(versions(&outcome.plan.sdk), vec!["8.0.100.1"]);
        assert_eq!(versions(&outcome.plan.runtime), vec!["8.0.100"]);
        assert!(outcome.dropped.is_empty());

        let json = serde_json::to_value(&ResolvedRequests::from_plan(&outcome.plan)).unwrap();
        assert_eq!(json["sdk"][0]["version"], "8.0.100.1");
        assert_eq!(json["sdk"][0]["specifier"], "8.0.100.1");
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let requests = ResolvedRequests {
            runtime: entries(&[("8.0.23", "8.0.23"), ("8.0.x", "8.0.23")]),
            ..Default::default()
        };

        let outcome = collapse(&requests, &[]);

        assert_eq!(versions(&outcome.plan.runtime), vec!["8.0.23"]);
        assert_eq!(outcome.dropped[0].specifier, "8.0.x");
        assert_eq!(outcome.dropped[0].rule, DropRule::DuplicateWithinType);
        assert_eq!(outcome.dropped[0].covered_by, "runtime 8.0.23");
    }

    #[test]
    fn bundled_runtimes_are_dropped() {
        let requests = ResolvedRequests {
            sdk: entries(&[("7.0.100", "7.0.100")]),
            runtime: entries(&[("7.0.0", "7.0.0")]),
            aspnetcore: entries(&[("7.0.0", "7.0.0")]),
        };
        let bundled = [(
            v("7.0.100"),
            IncludedVersions {
                runtime: Some(v("7.0.0")),
                aspnetcore: Some(v("7.0.0")),
            },
        )];

        let outcome = collapse(&requests, &bundled);

        assert_eq!(versions(&outcome.plan.sdk), vec!["7.0.100"]);
        assert!(outcome.plan.runtime.is_empty());
        assert!(outcome.plan.aspnetcore.is_empty());
        assert!(outcome
            .dropped
            .iter()
            .all(|d| d.rule == DropRule::BundledWithSdk && d.covered_by == "sdk 7.0.100"));
    }

    #[test]
    fn runtime_covered_by_aspnetcore_is_dropped_but_not_vice_versa() {
        let requests = ResolvedRequests {
            runtime: entries(&[("9.0.x", "9.0.3")]),
            aspnetcore: entries(&[("9.0.3", "9.0.3")]),
            ..Default::default()
        };

        let outcome = collapse(&requests, &[]);

        assert!(outcome.plan.runtime.is_empty());
        assert_eq!(versions(&outcome.plan.aspnetcore), vec!["9.0.3"]);
        assert_eq!(outcome.dropped[0].rule, DropRule::CoveredByAspNetCore);
        assert_eq!(outcome.dropped[0].covered_by, "aspnetcore 9.0.3");
    }

    #[test]
    fn sdks_are_never_dropped_across_types() {
        let requests = ResolvedRequests {
            sdk: entries(&[("8.0.x", "8.0.300"), ("9.0.100", "9.0.100"), ("8.0.300", "8.0.300")]),
            runtime: entries(&[("8.0.300", "8.0.300")]),
            aspnetcore: entries(&[("9.0.100", "9.0.100")]),
        };

        let outcome = collapse(&requests, &[]);

        assert_eq!(versions(&outcome.plan.sdk), vec!["8.0.300", "9.0.100"]);
        assert!(outcome.plan.runtime.is_empty());
        assert!(outcome.plan.aspnetcore.is_empty());
    }

    #[test]
    fn unrelated_entries_keep_request_order() {
        let requests = ResolvedRequests {
            runtime: entries(&[("9.0.3", "9.0.3"), ("6.0.36", "6.0.36"), ("8.0.23", "8.0.23")]),
            ..Default::default()
        };

        let outcome = collapse(&requests, &[]);

        assert_eq!(versions(&outcome.plan.runtime), vec!["9.0.3", "6.0.36", "8.0.23"]);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn collapse_is_idempotent() {
        let requests = ResolvedRequests {
            sdk: entries(&[("8.0.x", "8.0.300"), ("8.0.300", "8.0.300")]),
            runtime: entries(&[("8.0.23", "8.0.23"), ("6.0.x", "6.0.36"), ("8.0.x", "8.0.23")]),
            aspnetcore: entries(&[("8.0.23", "8.0.23"), ("9.0.3", "9.0.3")]),
        };
        let bundled = [(
            v("8.0.300"),
            IncludedVersions {
                runtime: Some(v("8.0.23")),
                aspnetcore: Some(v("8.0.23")),
            },
        )];

        let once = collapse(&requests, &bundled);
        let twice = collapse(&ResolvedRequests::from_plan(&once.plan), &bundled);

        assert_eq!(once.plan, twice.plan);
        assert!(twice.dropped.is_empty());
        assert_eq!(versions(&once.plan.runtime), vec!["6.0.36"]);
        assert_eq!(versions(&once.plan.aspnetcore), vec!["9.0.3"]);
    }

    #[test]
    fn hierarchy_invariant_holds() {
        let requests = ResolvedRequests {
            sdk: entries(&[("7.0.100", "7.0.100")]),
            runtime: entries(&[("7.0.0", "7.0.0"), ("7.0.100", "7.0.100"), ("6.0.0", "6.0.0")]),
            aspnetcore: entries(&[("7.0.0", "7.0.0"), ("6.0.0", "6.0.0")]),
        };
        let bundled = [(
            v("7.0.100"),
            IncludedVersions {
                runtime: Some(v("7.0.0")),
                aspnetcore: None,
            },
        )];

        let outcome = collapse(&requests, &bundled);
        let sdks: HashSet<&Version> = outcome.plan.sdk.iter().collect();

        for version in outcome.plan.runtime.iter().chain(&outcome.plan.aspnetcore) {
            assert!(!sdks.contains(version));
            assert_ne!(version, &v("7.0.0"));
        }
        assert!(outcome.plan.runtime.is_empty());
        assert_eq!(versions(&outcome.plan.aspnetcore), vec!["6.0.0"]);
    }
}
