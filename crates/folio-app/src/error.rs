//! # Design
//!
//! - Centralize application-level errors for wiring and command handling.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::error::Error as _;
use std::io;

use folio_config::ConfigError;
use folio_core::{BootstrapError, ContextError, MediaError, StoreError};
use folio_identity::IdentityError;
use folio_telemetry::TelemetryError;
use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: TelemetryError,
    },
    /// The identity client could not be built.
    #[error("identity client operation failed")]
    Identity {
        /// Operation identifier.
        operation: &'static str,
        /// Source identity error.
        source: IdentityError,
    },
    /// The language bootstrap failed.
    #[error("language bootstrap failed")]
    Bootstrap {
        /// Operation identifier.
        operation: &'static str,
        /// Source bootstrap error.
        source: BootstrapError,
    },
    /// The preference store failed.
    #[error("preference store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Source store error.
        source: StoreError,
    },
    /// A context lookup happened outside its provider.
    #[error("context lookup failed")]
    Context {
        /// Source context error.
        source: ContextError,
    },
    /// The identity provider rejected the request.
    #[error("identity provider rejected the request")]
    AuthRejected {
        /// Operation identifier.
        operation: &'static str,
        /// Provider message.
        message: String,
        /// Provider error code.
        code: Option<String>,
    },
    /// A media reference or upload descriptor was rejected.
    #[error("media validation failed")]
    Media {
        /// Operation identifier.
        operation: &'static str,
        /// Source media error.
        source: MediaError,
    },
    /// A command argument was invalid.
    #[error("invalid argument")]
    InvalidArgument {
        /// Argument name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(operation: &'static str, source: TelemetryError) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn identity(operation: &'static str, source: IdentityError) -> Self {
        Self::Identity { operation, source }
    }

    pub(crate) const fn bootstrap(operation: &'static str, source: BootstrapError) -> Self {
        Self::Bootstrap { operation, source }
    }

    pub(crate) const fn store(operation: &'static str, source: StoreError) -> Self {
        Self::Store { operation, source }
    }

    pub(crate) const fn context(source: ContextError) -> Self {
        Self::Context { source }
    }

    pub(crate) const fn media(operation: &'static str, source: MediaError) -> Self {
        Self::Media { operation, source }
    }

    /// Process exit code for this error: 2 for caller mistakes, 3 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. }
            | Self::InvalidArgument { .. }
            | Self::AuthRejected { .. }
            | Self::Media { .. } => 2,
            _ => 3,
        }
    }

    /// One-line message for the terminal, including the source chain.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Config { source, .. } => format!("{self}: {source} ({})", source.field()),
            Self::AuthRejected { message, .. } => message.clone(),
            Self::InvalidArgument {
                field,
                value,
                reason,
            } => format!("invalid {field} '{value}': {reason}"),
            _ => {
                let mut message = self.to_string();
                let mut source = self.source();
                while let Some(err) = source {
                    message.push_str(": ");
                    message.push_str(&err.to_string());
                    source = err.source();
                }
                message
            }
        }
    }
}
