#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! DOM-free client core for the Folio portfolio site.
//!
//! Layout:
//! - `language.rs`: supported language codes and preference resolution
//! - `i18n.rs`: localization subsystem contract plus the JSON-backed `Catalog`
//! - `preferences.rs`: keyed preference stores (memory, JSON file)
//! - `bootstrap.rs`: one-shot language bootstrap and the rendering gate
//! - `identity.rs`: identity-provider contract and result types
//! - `session.rs`: session bridge and the consumer-facing context
//! - `context.rs`: explicit dependency-injection scope
//! - `media.rs`: YouTube embedding and upload descriptors
//! - `error.rs`: error types for the modules above

pub mod bootstrap;
pub mod context;
pub mod error;
pub mod i18n;
pub mod identity;
pub mod language;
pub mod media;
pub mod preferences;
pub mod session;

pub use bootstrap::{
    BootstrapPhase, LOADING_PLACEHOLDER, LanguageBootstrap, LanguageGate, LoadingPlaceholder,
};
pub use context::Scope;
pub use error::{
    BootstrapError, BootstrapResult, ContextError, I18nError, I18nResult, MediaError,
    MediaResult, StoreError, StoreResult,
};
pub use i18n::{Catalog, Localizer, TranslationBundle};
pub use identity::{
    AuthData, AuthError, AuthResponse, AuthSubscription, IdentityProvider, PasswordCredentials,
    SignOutResponse, UserResponse,
};
pub use language::{DEFAULT_LANGUAGE, LANGUAGE_STORAGE_KEY, LanguageCode, resolve_language};
pub use media::{UploadKind, UploadPolicy, UploadedFile, YoutubeVideo, storage_object_path};
pub use preferences::{
    JsonFileStore, MemoryStore, PreferenceStore, load_language_preference, persist_language,
};
pub use session::{SessionBridge, SessionContext, SessionState, use_session};

pub use folio_events::{AuthChange, AuthChangeEvent, AuthEventBus, Session, User};
