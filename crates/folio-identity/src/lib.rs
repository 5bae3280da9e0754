#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! REST client for a hosted GoTrue identity service.
//!
//! Layout: client.rs (the `IdentityProvider` implementation), wire.rs (request
//! and error bodies), error.rs (construction and persistence errors).

pub mod client;
pub mod error;
mod wire;

pub use client::{ClientOptions, EXPIRY_MARGIN_SECS, GoTrueClient};
pub use error::{IdentityError, IdentityResult};
