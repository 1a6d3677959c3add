//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;

use crate::cli::args::{Cli, Commands};
use crate::config::EngineConfig;
use crate::error::Result;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, writing its report to `out`.
    ///
    /// Diagnostics go through `tracing` to stderr; `out` only carries results.
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config: EngineConfig,
}

impl CommandDispatcher {
    /// Create a new dispatcher sharing one engine configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configuration handed to each command.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, out: &mut dyn Write) -> Result<CommandResult> {
        match &cli.command {
            Commands::Plan(args) => {
                let cmd = super::plan::PlanCommand::new(self.config.clone(), args.clone());
                cmd.execute(out)
            }
            Commands::Resolve(args) => {
                let cmd = super::resolve::ResolveCommand::new(self.config.clone(), args.clone());
                cmd.execute(out)
            }
            Commands::Cache(args) => {
                let cmd = super::cache::CacheCommand::new(self.config.clone(), args.clone());
                cmd.execute(out)
            }
        }
    }
}
