//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cache::parse_ttl;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::version::ArtifactType;

/// dotplan - Resolve .NET SDK and runtime requests into a minimal install plan.
#[derive(Debug, Parser)]
#[command(name = "dotplan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Release index URL
    #[arg(long, global = true, env = "DOTPLAN_INDEX_URL")]
    pub index_url: Option<String>,

    /// Directory for cached release metadata
    #[arg(long, global = true, env = "DOTPLAN_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// How long cached metadata stays fresh (e.g. 12h, 30m)
    #[arg(long, global = true, env = "DOTPLAN_CACHE_TTL")]
    pub cache_ttl: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "DOTPLAN_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Engine settings from the global flags.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::default();

        if let Some(url) = &self.index_url {
            config = config.with_index_url(url);
        }
        if let Some(dir) = &self.cache_dir {
            config = config.with_cache_dir(dir);
        }
        if let Some(ttl) = &self.cache_ttl {
            let ttl = parse_ttl(ttl).map_err(|e| {
                anyhow::anyhow!("invalid --cache-ttl '{}': {}", ttl, e)
            })?;
            config = config.with_cache_ttl(ttl);
        }

        Ok(config)
    }
}

use super::commands::cache::CacheArgs;

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve requests into a minimal install plan
    Plan(PlanArgs),

    /// Resolve a single version specifier
    Resolve(ResolveArgs),

    /// Manage the release metadata cache
    Cache(CacheArgs),
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlanArgs {
    /// SDK specifier (repeatable)
    #[arg(long = "sdk", value_name = "SPEC")]
    pub sdk: Vec<String>,

    /// Runtime specifier (repeatable)
    #[arg(long = "runtime", value_name = "SPEC")]
    pub runtime: Vec<String>,

    /// ASP.NET Core runtime specifier (repeatable)
    #[arg(long = "aspnetcore", value_name = "SPEC")]
    pub aspnetcore: Vec<String>,

    /// global.json whose SDK pin is added to the plan
    #[arg(long, env = "DOTPLAN_GLOBAL_JSON")]
    pub global_json: Option<PathBuf>,

    /// Allow prerelease builds for --sdk/--runtime/--aspnetcore
    #[arg(long)]
    pub allow_prerelease: bool,

    /// Bypass the metadata cache
    #[arg(long)]
    pub no_cache: bool,

    /// Directory used to carry the metadata cache across runs
    #[arg(long, env = "DOTPLAN_DURABLE_CACHE")]
    pub durable_cache: Option<PathBuf>,

    /// Platform for the cache key (defaults to the host)
    #[arg(long)]
    pub platform: Option<String>,

    /// Architecture for the cache key (defaults to the host)
    #[arg(long)]
    pub arch: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `resolve` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ResolveArgs {
    /// Version specifier (e.g. 8.0.x, 8.0.1xx, lts)
    pub specifier: String,

    /// Artifact type the specifier targets
    #[arg(long = "type", value_enum, default_value_t = ArtifactType::Sdk)]
    pub artifact: ArtifactType,

    /// Allow prerelease builds
    #[arg(long)]
    pub allow_prerelease: bool,

    /// Bypass the metadata cache
    #[arg(long)]
    pub no_cache: bool,
}
