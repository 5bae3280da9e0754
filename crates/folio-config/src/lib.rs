#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Environment-driven configuration for the Folio client.
//!
//! Layout: `model.rs` (typed settings), `loader.rs` (variable names and
//! `SiteConfig::from_env`), `validate.rs` (parsing helpers).

pub mod error;
pub mod loader;
pub mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ENV_HTTP_TIMEOUT_SECS, ENV_IDENTITY_ANON_KEY, ENV_IDENTITY_URL, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    ENV_SESSION_KEY, ENV_STORAGE_PATH,
};
pub use model::{SiteConfig, TelemetryConfig};
