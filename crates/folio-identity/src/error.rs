//! # Design
//!
//! - Only construction and local persistence fail with `IdentityError`.
//! - Remote outcomes are reported as [`folio_core::AuthError`] data.

use folio_core::StoreError;
use thiserror::Error;

/// Result alias for identity client operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors raised while building the client or touching the persisted session.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The identity base URL cannot carry REST paths.
    #[error("invalid identity base url")]
    InvalidBaseUrl {
        /// Offending URL.
        value: String,
    },
    /// The anonymous key is not a valid header value.
    #[error("invalid anon key")]
    InvalidAnonKey,
    /// The HTTP client could not be constructed.
    #[error("failed to build http client")]
    HttpClient {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// Reading or writing the persisted session failed.
    #[error("session store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying store error.
        source: StoreError,
    },
    /// The persisted session could not be encoded or decoded.
    #[error("persisted session invalid")]
    SessionCodec {
        /// Store key holding the session.
        key: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
