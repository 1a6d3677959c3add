//! Finding the runtimes that ship inside an SDK.

use semver::Version;
use serde::Serialize;
use tracing::debug;

use crate::catalog::ReleaseCatalog;
use crate::error::Result;
use crate::version::{dotted, format_version, parse_version};

/// Runtime versions bundled with one SDK.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncludedVersions {
    #[serde(serialize_with = "dotted::serialize_opt")]
    pub runtime: Option<Version>,
    #[serde(serialize_with = "dotted::serialize_opt")]
    pub aspnetcore: Option<Version>,
}

impl IncludedVersions {
    /// Whether nothing is known about the SDK's contents.
    pub fn is_unknown(&self) -> bool {
        self.runtime.is_none() && self.aspnetcore.is_none()
    }
}

/// Maps SDK versions to the runtimes released alongside them.
pub struct SdkRuntimeMapper<'a> {
    catalog: &'a ReleaseCatalog,
}

impl<'a> SdkRuntimeMapper<'a> {
    /// Create a mapper reading from `catalog`.
    pub fn new(catalog: &'a ReleaseCatalog) -> Self {
        Self { catalog }
    }

    /// Runtime and ASP.NET Core versions shipped with `sdk`.
    ///
    /// An SDK missing from the catalog yields [`IncludedVersions::default`];
    /// only transport and manifest errors are returned.
    pub fn get_sdk_included_versions(&self, sdk: &Version) -> Result<IncludedVersions> {
        let channel = format!("{}.{}", sdk.major, sdk.minor);

        let wanted = format_version(sdk);
        let Some(manifest) = self.catalog.fetch_channel(&channel)? else {
            debug!(
                "Channel {} not in release index, no bundling info for SDK {}",
                channel, wanted
            );
            return Ok(IncludedVersions::default());
        };

        let Some(release) = manifest.release_for_sdk(&wanted) else {
            debug!("SDK {} not found in channel {} manifest", wanted, channel);
            return Ok(IncludedVersions::default());
        };

        let included = IncludedVersions {
            runtime: release.runtime_version().and_then(parse_version),
            aspnetcore: release.aspnetcore_version().and_then(parse_version),
        };

        debug!(
            "SDK {} ships runtime {:?} and aspnetcore {:?} (release {})",
            wanted,
            included.runtime.as_ref().map(format_version),
            included.aspnetcore.as_ref().map(format_version),
            release.release_version
        );
        Ok(included)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::serve_catalog;
    use crate::config::EngineConfig;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn catalog(server: &MockServer, temp: &TempDir) -> ReleaseCatalog {
        serve_catalog(
            server,
            &[("7.0", "sts", "eol")],
            &[(
                "7.0",
                json!({
                    "channel-version": "7.0",
                    "releases": [
                        {
                            "release-version": "7.0.1",
                            "sdks": [{"version": "7.0.101"}],
                            "runtime": {"version": "7.0.1"},
                            "aspnetcore-runtime": {"version": "7.0.1"}
                        },
                        {
                            "release-version": "7.0.0",
                            "sdk": {"version": "7.0.100"},
                            "runtime": {"version": "7.0.0"},
                            "aspnetcore-runtime": {"version": "7.0.0"}
                        }
                    ]
                }),
            )],
        );
        let config = EngineConfig::default()
            .with_index_url(server.url("/releases-index.json"))
            .with_cache_dir(temp.path().join("releases"));
        ReleaseCatalog::new(&config).unwrap()
    }

    #[test]
    fn finds_sibling_runtimes() {
        let server = MockServer::start();
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&server, &temp);

        let included = SdkRuntimeMapper::new(&catalog)
            .get_sdk_included_versions(&Version::new(7, 0, 100))
            .unwrap();

        assert_eq!(included.runtime, Some(Version::new(7, 0, 0)));
        assert_eq!(included.aspnetcore, Some(Version::new(7, 0, 0)));
    }

    #[test]
    fn unknown_sdk_is_not_an_error() {
        let server = MockServer::start();
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&server, &temp);
        let mapper = SdkRuntimeMapper::new(&catalog);

        assert!(mapper
            .get_sdk_included_versions(&Version::new(7, 0, 999))
            .unwrap()
            .is_unknown());
        assert!(mapper
            .get_sdk_included_versions(&Version::new(3, 1, 100))
            .unwrap()
            .is_unknown());
    }

    #[test]
    fn four_part_sdk_is_looked_up_in_dotted_form() {
        let server = MockServer::start();
        serve_catalog(
            &server,
            &[("8.0", "lts", "active")],
            &[(
                "8.0",
                json!({"channel-version": "8.0", "releases": [{
                    "release-version": "8.0.1",
                    "sdks": [{"version": "8.0.100.1"}],
                    "runtime": {"version": "8.0.1"},
                    "aspnetcore-runtime": {"version": "8.0.1"}
                }]}),
            )],
        );
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::default()
            .with_index_url(server.url("/releases-index.json"))
            .with_cache_dir(temp.path().join("releases"));
        let catalog = ReleaseCatalog::new(&config).unwrap();

        let included = SdkRuntimeMapper::new(&catalog)
            .get_sdk_included_versions(&parse_version("8.0.100.1").unwrap())
            .unwrap();

        assert_eq!(included.runtime, Some(Version::new(8, 0, 1)));
    }
}
