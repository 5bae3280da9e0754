#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Folio application wiring.
//!
//! Layout: `bootstrap.rs` (dependency construction and mounting),
//! `cli.rs` (argument parsing and exit codes), `commands.rs` (command handlers).

/// Dependency construction and the mounted application tree.
pub mod bootstrap;
/// Command-line surface.
pub mod cli;
/// Handlers behind each command.
pub mod commands;
/// Application-level errors.
pub mod error;

pub use bootstrap::{AppDependencies, MountedApp, init_telemetry, mount};
pub use cli::{Cli, Command, run_cli};
pub use error::{AppError, AppResult};
