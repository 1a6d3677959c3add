//! Resolve command implementation.
//!
//! Provides `dotplan resolve <SPEC>`, printing one concrete version.

use std::io::Write;

use crate::catalog::ReleaseCatalog;
use crate::cli::args::ResolveArgs;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::version::{format_version, VersionResolver};

use super::dispatcher::{Command, CommandResult};

/// The resolve command implementation.
pub struct ResolveCommand {
    config: EngineConfig,
    args: ResolveArgs,
}

impl ResolveCommand {
    /// Create a new resolve command.
    pub fn new(config: EngineConfig, args: ResolveArgs) -> Self {
        let config = config.with_cache_enabled(!args.no_cache);
        Self { config, args }
    }
}

impl Command for ResolveCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let catalog = ReleaseCatalog::new(&self.config)?;
        let version = VersionResolver::new(&catalog).resolve_version(
            self.args.specifier.trim(),
            self.args.artifact,
            self.args.allow_prerelease,
        )?;

        writeln!(out, "{}", format_version(&version))?;
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::serve_catalog;
    use crate::error::PlanError;
    use crate::version::ArtifactType;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn args(specifier: &str, artifact: ArtifactType) -> ResolveArgs {
        ResolveArgs {
            specifier: specifier.to_string(),
            artifact,
            allow_prerelease: false,
            no_cache: true,
        }
    }

    #[test]
    fn prints_resolved_version() {
        let server = MockServer::start();
        serve_catalog(
            &server,
            &[("8.0", "lts", "active")],
            &[(
                "8.0",
                json!({"channel-version": "8.0", "releases": [{
                    "release-version": "8.0.23",
                    "sdks": [{"version": "8.0.417"}, {"version": "8.0.123"}],
                    "runtime": {"version": "8.0.23"},
                    "aspnetcore-runtime": {"version": "8.0.23"}
                }]}),
            )],
        );
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::default()
            .with_index_url(server.url("/releases-index.json"))
            .with_cache_dir(temp.path());

        let mut out = Vec::new();
        ResolveCommand::new(config, args("8.0.1xx", ArtifactType::Sdk))
            .execute(&mut out)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "8.0.123\n");
        assert!(std::fs::read_dir(temp.path()).unwrap().next().is_none());
    }

    #[test]
    fn prints_four_part_version_unchanged() {
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::default()
            .with_index_url("http://127.0.0.1:9/releases-index.json")
            .with_cache_dir(temp.path());

        let mut out = Vec::new();
        ResolveCommand::new(config, args("8.0.100.1", ArtifactType::Sdk))
            .execute(&mut out)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "8.0.100.1\n");
    }

    #[test]
    fn resolution_errors_propagate() {
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::default().with_cache_dir(temp.path());

        let mut out = Vec::new();
        let err = ResolveCommand::new(config, args("not-a-version", ArtifactType::Runtime))
            .execute(&mut out)
            .unwrap_err();

        assert!(matches!(err, PlanError::InvalidSpecifier { .. }));
        assert!(out.is_empty());
    }
}
