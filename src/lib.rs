//! dotplan - .NET SDK and runtime version resolution.
//!
//! dotplan turns loose version requests (`8.0.x`, `8.0.1xx`, `lts`, a
//! `global.json` pin) into concrete versions using the official release
//! metadata, then drops every entry another entry already provides.
//!
//! # Modules
//!
//! - [`cache`] - Disk freshness cache and durable cache keys
//! - [`catalog`] - Release index and channel manifest access
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Engine settings and `global.json` parsing
//! - [`error`] - Error types and result aliases
//! - [`plan`] - Deduplication, SDK bundling, and plan cache keys
//! - [`policy`] - Roll-forward policy translation
//! - [`version`] - Specifier parsing and resolution
//!
//! # Example
//!
//! ```
//! use dotplan::version::{ArtifactType, VersionSpecifier};
//!
//! let spec = VersionSpecifier::parse("8.0.1xx", ArtifactType::Sdk).unwrap();
//! assert!(spec.needs_catalog());
//! assert_eq!(spec.to_string(), "8.0.1xx");
//! ```
//!
//! For catalog-backed resolution, see the integration tests.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod plan;
pub mod policy;
pub mod version;

pub use error::{PlanError, Result};
