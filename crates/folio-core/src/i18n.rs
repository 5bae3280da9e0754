//! Localization subsystem contract and a JSON-backed implementation.
//!
//! # Design
//! - `Localizer` is the seam the bootstrap talks to; it mirrors the handful of
//!   operations the bootstrap needs (`is_initialized`, `init`, `language`,
//!   `change_language`) and nothing else.
//! - `Catalog` keeps one parsed JSON tree per language and resolves dotted
//!   paths with a fallback to the default language.
//! - Language detection is deliberately absent: `init` activates the fallback
//!   and the bootstrap decides the real language.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{I18nError, I18nResult};
use crate::language::{DEFAULT_LANGUAGE, LanguageCode};

/// Operations the language bootstrap consumes from the localization subsystem.
#[async_trait]
pub trait Localizer: Send + Sync {
    /// Whether `init` has completed.
    fn is_initialized(&self) -> bool;

    /// Load translations and make the subsystem usable.
    async fn init(&self) -> I18nResult<()>;

    /// Currently active language code, if any.
    fn language(&self) -> Option<String>;

    /// Activate another language.
    async fn change_language(&self, language: LanguageCode) -> I18nResult<()>;
}

/// Parsed translation tree for one language.
#[derive(Clone, Debug)]
pub struct TranslationBundle {
    language: LanguageCode,
    tree: Value,
}

impl PartialEq for TranslationBundle {
    fn eq(&self, other: &Self) -> bool {
        self.language == other.language
    }
}

impl TranslationBundle {
    /// Parse a bundle from raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::InvalidBundle`] when `raw` is not valid JSON.
    pub fn parse(language: LanguageCode, raw: &str) -> I18nResult<Self> {
        let tree = serde_json::from_str(raw)
            .map_err(|source| I18nError::InvalidBundle { language, source })?;
        Ok(Self { language, tree })
    }

    /// Language backing this bundle.
    #[must_use]
    pub const fn language(&self) -> LanguageCode {
        self.language
    }

    /// Resolve a dotted path (`section.key`) to a string leaf.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<String> {
        let mut node = &self.tree;
        for segment in path.split('.') {
            node = node.get(segment)?;
        }
        node.as_str().map(ToString::to_string)
    }
}

#[derive(Default)]
struct CatalogState {
    initialized: bool,
    language: Option<LanguageCode>,
    bundles: HashMap<LanguageCode, TranslationBundle>,
}

/// In-process localization subsystem backed by JSON bundles.
pub struct Catalog {
    sources: Vec<(LanguageCode, Cow<'static, str>)>,
    fallback: LanguageCode,
    state: RwLock<CatalogState>,
}

impl Catalog {
    /// Catalog over the bundles shipped with the crate.
    #[must_use]
    pub fn new() -> Self {
        let sources = LanguageCode::all()
            .into_iter()
            .map(|language| (language, Cow::Borrowed(raw_bundle(language))))
            .collect();
        Self::with_sources(sources)
    }

    /// Catalog over caller-supplied bundle sources.
    #[must_use]
    pub fn from_sources(sources: impl IntoIterator<Item = (LanguageCode, String)>) -> Self {
        Self::with_sources(
            sources
                .into_iter()
                .map(|(language, raw)| (language, Cow::Owned(raw)))
                .collect(),
        )
    }

    fn with_sources(sources: Vec<(LanguageCode, Cow<'static, str>)>) -> Self {
        Self {
            sources,
            fallback: DEFAULT_LANGUAGE,
            state: RwLock::new(CatalogState::default()),
        }
    }

    /// Active language as a typed code.
    #[must_use]
    pub fn active_language(&self) -> Option<LanguageCode> {
        self.read().language
    }

    /// Resolve `path` in the active language, then the fallback, then `default`.
    #[must_use]
    pub fn text(&self, path: &str, default: &str) -> String {
        let state = self.read();
        let active = state
            .language
            .and_then(|language| state.bundles.get(&language))
            .and_then(|bundle| bundle.lookup(path));
        active
            .or_else(|| {
                state
                    .bundles
                    .get(&self.fallback)
                    .and_then(|bundle| bundle.lookup(path))
            })
            .unwrap_or_else(|| default.to_string())
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Localizer for Catalog {
    fn is_initialized(&self) -> bool {
        self.read().initialized
    }

    async fn init(&self) -> I18nResult<()> {
        let mut bundles = HashMap::with_capacity(self.sources.len());
        for (language, raw) in &self.sources {
            let bundle = TranslationBundle::parse(*language, raw)?;
            bundles.insert(*language, bundle);
        }

        let mut state = self.write();
        state.bundles = bundles;
        state.initialized = true;
        state.language = Some(self.fallback);
        info!(
            bundles = state.bundles.len(),
            language = %self.fallback,
            "localization initialized"
        );
        Ok(())
    }

    fn language(&self) -> Option<String> {
        self.read().language.map(|language| language.code().to_string())
    }

    async fn change_language(&self, language: LanguageCode) -> I18nResult<()> {
        let mut state = self.write();
        if !state.initialized {
            return Err(I18nError::NotInitialized {
                operation: "change_language",
            });
        }
        if !state.bundles.contains_key(&language) {
            return Err(I18nError::MissingBundle { language });
        }
        let previous = state.language.replace(language);
        debug!(from = ?previous, to = %language, "active language changed");
        Ok(())
    }
}

const fn raw_bundle(language: LanguageCode) -> &'static str {
    match language {
        LanguageCode::En => include_str!("../i18n/en.json"),
        LanguageCode::Es => include_str!("../i18n/es.json"),
        LanguageCode::Ca => include_str!("../i18n/ca.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_activates_fallback_language() {
        let catalog = Catalog::new();
        assert!(!catalog.is_initialized());
        assert!(catalog.language().is_none());

        catalog.init().await.expect("embedded bundles parse");
        assert!(catalog.is_initialized());
        assert_eq!(catalog.language().as_deref(), Some("ca"));
    }

    #[tokio::test]
    async fn change_language_requires_init() {
        let catalog = Catalog::new();
        let err = catalog
            .change_language(LanguageCode::Es)
            .await
            .expect_err("not initialized");
        assert!(matches!(err, I18nError::NotInitialized { .. }));
    }

    #[tokio::test]
    async fn missing_bundle_is_rejected() {
        let catalog = Catalog::from_sources([(
            LanguageCode::Ca,
            r#"{"nav":{"home":"Inici"}}"#.to_string(),
        )]);
        catalog.init().await.expect("init");
        let err = catalog
            .change_language(LanguageCode::En)
            .await
            .expect_err("english was not loaded");
        assert!(matches!(err, I18nError::MissingBundle { language: LanguageCode::En }));
        assert_eq!(catalog.active_language(), Some(LanguageCode::Ca));
    }

    #[tokio::test]
    async fn invalid_bundle_fails_init() {
        let catalog = Catalog::from_sources([(LanguageCode::En, "{not json".to_string())]);
        let err = catalog.init().await.expect_err("invalid json");
        assert!(matches!(err, I18nError::InvalidBundle { language: LanguageCode::En, .. }));
        assert!(!catalog.is_initialized());
    }

    #[tokio::test]
    async fn text_falls_back_to_catalan_then_default() {
        let catalog = Catalog::from_sources([
            (LanguageCode::Ca, r#"{"nav":{"home":"Inici","admin":"Administració"}}"#.to_string()),
            (LanguageCode::En, r#"{"nav":{"home":"Home"}}"#.to_string()),
        ]);
        catalog.init().await.expect("init");
        catalog.change_language(LanguageCode::En).await.expect("switch");

        assert_eq!(catalog.text("nav.home", "?"), "Home");
        assert_eq!(catalog.text("nav.admin", "?"), "Administració");
        assert_eq!(catalog.text("nav.missing", "fallback"), "fallback");
    }

    #[tokio::test]
    async fn embedded_bundles_cover_navigation() {
        let catalog = Catalog::new();
        catalog.init().await.expect("init");
        for language in LanguageCode::all() {
            catalog.change_language(language).await.expect("switch");
            assert_ne!(catalog.text("nav.home", ""), "");
            assert_ne!(catalog.text("auth.sign_in", ""), "");
        }
    }
}
