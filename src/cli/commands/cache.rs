//! Cache command implementation.
//!
//! Provides `dotplan cache list`, `dotplan cache clear`, etc.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::io::Write;

use crate::cache::{format_duration, CacheStore, CacheValidator};
use crate::config::EngineConfig;

use super::dispatcher::{Command, CommandResult};

/// Arguments for the cache command.
#[derive(Debug, Clone, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

/// Cache subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum CacheSubcommand {
    /// List cached documents.
    List {
        /// Show detailed information.
        #[arg(long)]
        verbose: bool,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Clear the cache.
    Clear {
        /// Only clear documents past their freshness window.
        #[arg(long)]
        stale: bool,
    },
    /// Show cache statistics.
    Stats,
}

/// The cache command implementation.
pub struct CacheCommand {
    config: EngineConfig,
    args: CacheArgs,
}

impl CacheCommand {
    /// Create a new cache command.
    pub fn new(config: EngineConfig, args: CacheArgs) -> Self {
        Self { config, args }
    }
}

impl Command for CacheCommand {
    fn execute(&self, out: &mut dyn Write) -> crate::error::Result<CommandResult> {
        let store = CacheStore::new(&self.config.cache_dir);

        let exit_code = match &self.args.command {
            CacheSubcommand::List { verbose, json } => list_cache(&store, *verbose, *json, out)?,
            CacheSubcommand::Clear { stale } => clear_cache(&store, *stale, out)?,
            CacheSubcommand::Stats => show_stats(&store, out)?,
        };

        Ok(if exit_code == 0 {
            CommandResult::success()
        } else {
            CommandResult::failure(exit_code)
        })
    }
}

fn list_cache(store: &CacheStore, verbose: bool, json: bool, out: &mut dyn Write) -> Result<i32> {
    let entries = store.list()?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(0);
    }

    if entries.is_empty() {
        writeln!(out, "Cache is empty")?;
        return Ok(0);
    }

    writeln!(out, "{} cached documents:\n", entries.len())?;

    for entry in entries {
        let status = if entry.is_stale() { "stale" } else { "fresh" };
        let window = if entry.is_stale() {
            "refetch".to_string()
        } else {
            format!("{} left", format_duration(entry.fresh_for()))
        };

        if verbose {
            writeln!(out, "  {} ({})", entry.url, entry.document)?;
            writeln!(out, "    Status: {}", status)?;
            writeln!(out, "    Fresh for: {}", window)?;
            writeln!(out, "    Age: {}", format_duration(entry.age()))?;
            writeln!(out, "    Size: {} bytes", entry.metadata.size_bytes)?;
            writeln!(out)?;
        } else {
            writeln!(
                out,
                "  {:<16}[{}] {} {}",
                entry.document.to_string(),
                status,
                window,
                entry.url
            )?;
        }
    }

    Ok(0)
}

fn clear_cache(store: &CacheStore, stale_only: bool, out: &mut dyn Write) -> Result<i32> {
    if stale_only {
        let purged = CacheValidator::new(store).purge_stale()?;
        writeln!(out, "Cleared {} stale entries", purged)?;
        return Ok(0);
    }

    let cleared = store.clear()?;
    if cleared == 0 {
        writeln!(out, "Cache is already empty")?;
    } else {
        writeln!(out, "Cleared {} entries", cleared)?;
    }

    Ok(0)
}

fn show_stats(store: &CacheStore, out: &mut dyn Write) -> Result<i32> {
    let entries = store.list()?;
    let total_size = store.total_size()?;
    let stale_count = entries.iter().filter(|e| e.is_stale()).count();
    let fresh_count = entries.len() - stale_count;

    writeln!(out, "Cache Statistics:\n")?;
    writeln!(out, "  Total entries: {}", entries.len())?;
    writeln!(out, "  Fresh: {}", fresh_count)?;
    writeln!(out, "  Stale: {}", stale_count)?;
    writeln!(out, "  Total size: {} bytes", total_size)?;
    writeln!(out, "  Location: {}", store.root().display())?;

    Ok(0)
}
