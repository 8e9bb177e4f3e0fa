//! `parity` - database backup, restore and deploy helper for Heroku-hosted
//! application environments
//!
//! Wraps the platform CLI, the `PostgreSQL` client tools and `git` in fixed
//! command sequences chosen by environment name.

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/// Local backup artifact handling
pub mod backup;
/// Command line interface definition
pub mod cli;
pub mod commands;
/// Settings loading and validation
pub mod config;
pub mod database;
pub mod environment;
/// Error types
pub mod error;
pub mod pipeline;
pub mod process;
pub mod remote;
pub mod restore;
pub mod router;

pub use commands::Outcome;
pub use config::Settings;
pub use environment::{EnvironmentName, EnvironmentRoles};
pub use error::{ParityError, Result};
pub use process::{CommandRunner, CommandSpec, SystemRunner};
pub use restore::{RestoreOrchestrator, RestoreRequest, RestoreStrategy};
pub use router::EnvironmentCommandRouter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
