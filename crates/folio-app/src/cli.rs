//! Command-line surface for the `folio` binary.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use folio_config::SiteConfig;
use folio_telemetry::GlobalContextGuard;
use tracing::{error, info};
use uuid::Uuid;

use crate::bootstrap::{AppDependencies, init_telemetry};
use crate::commands;
use crate::error::{AppError, AppResult};

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "folio", about = "Client tools for the Folio portfolio site")]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mount the client and log session changes until Ctrl-C.
    Run,
    /// Inspect or change the preferred language.
    #[command(subcommand)]
    Language(LanguageCommand),
    /// Sign in with email and password.
    SignIn {
        /// Account email.
        #[arg(long, env = "FOLIO_EMAIL")]
        email: String,
        /// Account password.
        #[arg(long, env = "FOLIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the current session.
    SignOut,
    /// Show the signed-in user.
    Whoami,
    /// Media helpers that need no identity service.
    #[command(subcommand)]
    Media(MediaCommand),
}

/// `folio language ...`
#[derive(Debug, Subcommand)]
pub enum LanguageCommand {
    /// Print the language the site starts in.
    Show,
    /// Persist a preferred language (`ca`, `es` or `en`).
    Set {
        /// Language code.
        code: String,
    },
}

/// `folio media ...`
#[derive(Debug, Subcommand)]
pub enum MediaCommand {
    /// Resolve a YouTube link into embed, watch and thumbnail URLs.
    Youtube {
        /// Video link in any common form.
        url: String,
    },
    /// Check a file against the upload policy.
    Check {
        /// File name.
        name: String,
        /// Declared MIME type.
        content_type: String,
        /// Size in bytes.
        size: u64,
    },
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Run => "run",
        Command::Language(LanguageCommand::Show) => "language_show",
        Command::Language(LanguageCommand::Set { .. }) => "language_set",
        Command::SignIn { .. } => "sign_in",
        Command::SignOut => "sign_out",
        Command::Whoami => "whoami",
        Command::Media(MediaCommand::Youtube { .. }) => "media_youtube",
        Command::Media(MediaCommand::Check { .. }) => "media_check",
    }
}

/// Execute `cli` and map the outcome onto a process exit code.
pub async fn run_cli(cli: Cli) -> ExitCode {
    let label = command_label(&cli.command);
    match execute(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(command = label, error = %err, "command failed");
            eprintln!("error: {}", err.display_message());
            ExitCode::from(err.exit_code())
        }
    }
}

async fn execute(cli: Cli) -> AppResult<String> {
    let command = match cli.command {
        Command::Media(media) => return run_media(media),
        other => other,
    };

    let config = SiteConfig::from_env().map_err(|err| AppError::config("config.load", err))?;
    init_telemetry(&config)?;
    let label = command_label(&command);
    let _context = GlobalContextGuard::new(label);
    info!(command = label, "command started");

    let dependencies = AppDependencies::from_config(&config)?;
    dispatch(command, &dependencies).await
}

async fn dispatch(command: Command, dependencies: &AppDependencies) -> AppResult<String> {
    match command {
        Command::Run => commands::run_until(dependencies, tokio::signal::ctrl_c()).await,
        Command::Language(LanguageCommand::Show) => commands::language_show(dependencies).await,
        Command::Language(LanguageCommand::Set { code }) => {
            commands::language_set(dependencies, &code)
        }
        Command::SignIn { email, password } => {
            commands::sign_in(dependencies, &email, &password).await
        }
        Command::SignOut => commands::sign_out(dependencies).await,
        Command::Whoami => commands::whoami(dependencies).await,
        Command::Media(media) => run_media(media),
    }
}

fn run_media(command: MediaCommand) -> AppResult<String> {
    match command {
        MediaCommand::Youtube { url } => commands::media_youtube(&url),
        MediaCommand::Check {
            name,
            content_type,
            size,
        } => commands::media_check(&name, &content_type, size, Uuid::new_v4()),
    }
}
