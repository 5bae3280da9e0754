#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Binary entrypoint for the `folio` command-line client.

use std::process::ExitCode;

use clap::Parser;
use folio_app::{Cli, run_cli};

/// Parse arguments, run the command and exit with its status.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    run_cli(Cli::parse()).await
}
