//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`dotplan plan`, `dotplan resolve`)
//! - Shared engine configuration from the global flags
//! - Output written to any [`std::io::Write`], so commands are testable

pub mod cache;
pub mod dispatcher;
pub mod plan;
pub mod resolve;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
