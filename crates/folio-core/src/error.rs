//! # Design
//!
//! - One error enum per concern so callers can match on what failed.
//! - Keep messages constant and carry the details as fields.
//! - Identity-provider failures are not here: they travel as data in
//!   [`crate::identity::AuthError`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::language::LanguageCode;

/// Result alias for localization operations.
pub type I18nResult<T> = Result<T, I18nError>;

/// Errors raised by the localization subsystem.
#[derive(Debug, Error)]
pub enum I18nError {
    /// An operation required `init` to have completed.
    #[error("localization subsystem not initialized")]
    NotInitialized {
        /// Operation that was attempted.
        operation: &'static str,
    },
    /// A translation bundle could not be parsed.
    #[error("invalid translation bundle")]
    InvalidBundle {
        /// Language of the offending bundle.
        language: LanguageCode,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// No bundle was loaded for the requested language.
    #[error("missing translation bundle")]
    MissingBundle {
        /// Requested language.
        language: LanguageCode,
    },
}

/// Result alias for the language bootstrap.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Failures that abort the language bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Initializing the localization subsystem failed.
    #[error("localization initialization failed")]
    LocalizerInit {
        /// Underlying localization error.
        source: I18nError,
    },
    /// Switching the active language failed.
    #[error("language switch failed")]
    LanguageSwitch {
        /// Language the bootstrap tried to activate.
        language: LanguageCode,
        /// Underlying localization error.
        source: I18nError,
    },
}

/// Result alias for preference store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by preference stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("preference store io failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The backing file did not contain a flat JSON object of strings.
    #[error("preference store contents invalid")]
    Corrupt {
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A value could not be encoded for storage.
    #[error("preference value encoding failed")]
    Encode {
        /// Key being written.
        key: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors raised when looking up provided context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The lookup happened outside the subtree of the required provider.
    #[error("{context} requested outside of {provider}; mount {provider} above this consumer")]
    MissingProvider {
        /// Name of the requested context.
        context: &'static str,
        /// Name of the provider that must be mounted.
        provider: &'static str,
    },
}

/// Result alias for media helpers.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors raised while interpreting media references and uploads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The input was not a parseable URL.
    #[error("invalid media url")]
    InvalidUrl {
        /// Offending input.
        value: String,
    },
    /// The URL does not point at a YouTube video.
    #[error("unsupported video host")]
    UnsupportedHost {
        /// Host found in the URL.
        host: String,
    },
    /// The URL has no usable video identifier.
    #[error("missing or malformed video id")]
    InvalidVideoId {
        /// Offending input.
        value: String,
    },
    /// The uploaded file is empty.
    #[error("empty upload")]
    EmptyUpload {
        /// File name.
        name: String,
    },
    /// The uploaded file exceeds the size limit.
    #[error("upload too large")]
    UploadTooLarge {
        /// File name.
        name: String,
        /// Size of the file.
        size_bytes: u64,
        /// Configured limit.
        max_bytes: u64,
    },
    /// The uploaded file's content type is not allowed.
    #[error("upload type not allowed")]
    UploadTypeNotAllowed {
        /// File name.
        name: String,
        /// Declared content type.
        content_type: String,
    },
}
