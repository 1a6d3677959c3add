//! Plan command implementation.
//!
//! Provides `dotplan plan`, which resolves every requested specifier and
//! prints the deduplicated install plan with its cache key.

use serde::Serialize;
use std::io::Write;

use crate::cache::DirectoryArtifactCache;
use crate::catalog::ReleaseCatalog;
use crate::cli::args::PlanArgs;
use crate::config::{EngineConfig, GlobalJson};
use crate::error::Result;
use crate::plan::{generate_cache_key, plan_install, DropReason, InstallPlan, InstallRequest};
use crate::version::format_version;

use super::dispatcher::{Command, CommandResult};

/// Platform name used in cache keys for the running host.
pub fn host_platform() -> String {
    match std::env::consts::OS {
        "windows" => "win",
        "macos" => "osx",
        other => other,
    }
    .to_string()
}

/// Architecture name used in cache keys for the running host.
pub fn host_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    }
    .to_string()
}

#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    plan: &'a InstallPlan,
    dropped: &'a [DropReason],
    cache_key: &'a str,
}

/// The plan command implementation.
pub struct PlanCommand {
    config: EngineConfig,
    args: PlanArgs,
}

impl PlanCommand {
    /// Create a new plan command.
    pub fn new(config: EngineConfig, args: PlanArgs) -> Self {
        let mut config = config.with_cache_enabled(!args.no_cache);
        config.allow_prerelease = args.allow_prerelease;
        config.global_json = args.global_json.clone();
        Self { config, args }
    }

    fn request(&self) -> Result<InstallRequest> {
        let global_json = self
            .config
            .global_json
            .as_deref()
            .map(GlobalJson::load)
            .transpose()?;

        Ok(InstallRequest {
            sdk: self.args.sdk.clone(),
            runtime: self.args.runtime.clone(),
            aspnetcore: self.args.aspnetcore.clone(),
            allow_prerelease: self.config.allow_prerelease,
            global_json,
        })
    }
}

impl Command for PlanCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let request = self.request()?;

        let mut catalog = ReleaseCatalog::new(&self.config)?;
        if let Some(dir) = &self.args.durable_cache {
            catalog = catalog.with_durable_cache(DirectoryArtifactCache::new(dir));
        }

        catalog.open();
        let planned = plan_install(&catalog, &request);
        catalog.flush();
        let outcome = planned?;

        let platform = self.args.platform.clone().unwrap_or_else(host_platform);
        let arch = self.args.arch.clone().unwrap_or_else(host_arch);
        let cache_key = generate_cache_key(&outcome.plan, &platform, &arch);

        if self.args.json {
            let report = PlanReport {
                plan: &outcome.plan,
                dropped: &outcome.dropped,
                cache_key: &cache_key,
            };
            let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
            writeln!(out, "{}", json)?;
            return Ok(CommandResult::success());
        }

        if outcome.plan.is_empty() {
            writeln!(out, "Nothing to install")?;
        }
        for item in outcome.plan.items() {
            writeln!(
                out,
                "{:<12}{}",
                item.artifact.as_str(),
                format_version(&item.version)
            )?;
        }

        if !outcome.dropped.is_empty() {
            writeln!(out, "\nDropped:")?;
            for drop in &outcome.dropped {
                writeln!(
                    out,
                    "  {} {} -> {} ({}, {})",
                    drop.artifact,
                    drop.specifier,
                    format_version(&drop.version),
                    drop.rule,
                    drop.covered_by
                )?;
            }
        }

        writeln!(out, "\nCache key: {}", cache_key)?;
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::serve_catalog;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn seven_catalog(server: &MockServer) {
        serve_catalog(
            server,
            &[("7.0", "sts", "eol")],
            &[(
                "7.0",
                json!({"channel-version": "7.0", "releases": [{
                    "release-version": "7.0.0",
                    "sdks": [{"version": "7.0.100"}],
                    "runtime": {"version": "7.0.0"},
                    "aspnetcore-runtime": {"version": "7.0.0"}
                }]}),
            )],
        );
    }

    fn config(server: &MockServer, temp: &TempDir) -> EngineConfig {
        EngineConfig::default()
            .with_index_url(server.url("/releases-index.json"))
            .with_cache_dir(temp.path().join("releases"))
    }

    fn args() -> PlanArgs {
        PlanArgs {
            sdk: vec!["7.0.100".to_string()],
            runtime: vec!["7.0.x".to_string()],
            platform: Some("linux".to_string()),
            arch: Some("x64".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn prints_plan_drops_and_key() {
        let server = MockServer::start();
        seven_catalog(&server);
        let temp = TempDir::new().unwrap();

        let mut out = Vec::new();
        let result = PlanCommand::new(config(&server, &temp), args())
            .execute(&mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(result.success);
        assert!(text.contains("sdk         7.0.100"));
        assert!(text.contains("runtime 7.0.x -> 7.0.0 (bundled with sdk, sdk 7.0.100)"));
        assert!(text.contains("Cache key: linux-x64-"));
    }

    #[test]
    fn json_report_is_machine_readable() {
        let server = MockServer::start();
        seven_catalog(&server);
        let temp = TempDir::new().unwrap();

        let mut out = Vec::new();
        PlanCommand::new(
            config(&server, &temp),
            PlanArgs {
                json: true,
                ..args()
            },
        )
        .execute(&mut out)
        .unwrap();

        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["plan"]["sdk"], json!(["7.0.100"]));
        assert_eq!(report["plan"]["runtime"], json!([]));
        assert_eq!(report["dropped"][0]["rule"], "bundled-with-sdk");
        assert!(report["cache_key"].as_str().unwrap().starts_with("linux-x64-"));
    }

    #[test]
    fn durable_cache_is_saved_after_planning() {
        let server = MockServer::start();
        seven_catalog(&server);
        let temp = TempDir::new().unwrap();
        let durable = temp.path().join("durable");

        let mut out = Vec::new();
        PlanCommand::new(
            config(&server, &temp),
            PlanArgs {
                durable_cache: Some(durable.clone()),
                ..args()
            },
        )
        .execute(&mut out)
        .unwrap();

        let keys: Vec<String> = fs::read_dir(&durable)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("dotnet-releases-"));
    }

    #[test]
    fn reads_global_json_file() {
        let server = MockServer::start();
        seven_catalog(&server);
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.json");
        fs::write(&global, r#"{"sdk": {"version": "7.0.100", "rollForward": "latestFeature"}}"#)
            .unwrap();

        let mut out = Vec::new();
        PlanCommand::new(
            config(&server, &temp),
            PlanArgs {
                sdk: vec![],
                runtime: vec![],
                global_json: Some(global),
                ..args()
            },
        )
        .execute(&mut out)
        .unwrap();

        assert!(String::from_utf8(out).unwrap().contains("sdk         7.0.100"));
    }

    #[test]
    fn empty_request_needs_no_network() {
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::default()
            .with_index_url("http://127.0.0.1:9/releases-index.json")
            .with_cache_dir(temp.path());

        let mut out = Vec::new();
        PlanCommand::new(
            config,
            PlanArgs {
                sdk: vec![],
                runtime: vec![],
                ..args()
            },
        )
        .execute(&mut out)
        .unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Nothing to install"));
    }

    #[test]
    fn host_names_follow_dotnet_conventions() {
        assert!(!host_platform().is_empty());
        assert_ne!(host_arch(), "x86_64");
        assert_ne!(host_platform(), "macos");
    }
}
