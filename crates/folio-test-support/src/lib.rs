#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (users, sessions, env lookups), mocks.rs (fake identity
//! provider and localizer).

pub mod fixtures;
pub mod mocks;

pub use fixtures::{env_lookup, sample_session, sample_user};
pub use mocks::{FakeIdentityProvider, FakeLocalizer};
