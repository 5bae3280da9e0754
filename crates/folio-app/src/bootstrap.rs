//! Dependency construction and mounting of the client tree.
//!
//! # Design
//! - `AppDependencies` is the only place that picks concrete implementations.
//! - `mount` runs the language bootstrap to completion before the session
//!   bridge exists, matching the render order of the site.
//! - Everything consumers need is reachable from the returned `Scope`.

use std::sync::Arc;

use folio_config::SiteConfig;
use folio_core::{
    Catalog, IdentityProvider, JsonFileStore, LanguageBootstrap, LanguageCode, LanguageGate,
    PreferenceStore, Scope, SessionBridge, SessionContext, use_session,
};
use folio_identity::{ClientOptions, GoTrueClient};
use folio_telemetry::{LoggingConfig, init_logging, log_format_from_config};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// Install the tracing subscriber described by `config`.
///
/// # Errors
///
/// Returns an error when the level is not a valid directive or a subscriber
/// is already installed.
pub fn init_telemetry(config: &SiteConfig) -> AppResult<()> {
    let logging = LoggingConfig {
        level: &config.telemetry.level,
        format: log_format_from_config(config.telemetry.format.as_deref()),
        build_sha: option_env!("FOLIO_BUILD_SHA").unwrap_or("dev"),
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))
}

/// Concrete collaborators shared by every command.
#[derive(Clone)]
pub struct AppDependencies {
    store: Arc<dyn PreferenceStore>,
    catalog: Arc<Catalog>,
    identity: Arc<dyn IdentityProvider>,
}

impl AppDependencies {
    /// Production wiring: JSON file store plus the GoTrue client.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity client cannot be built.
    pub fn from_config(config: &SiteConfig) -> AppResult<Self> {
        let store: Arc<dyn PreferenceStore> = Arc::new(JsonFileStore::open(&config.storage_path));
        let options = ClientOptions {
            base_url: config.identity_url.clone(),
            anon_key: config.anon_key.clone(),
            session_key: config.session_key.clone(),
            timeout: config.http_timeout,
        };
        let client = GoTrueClient::new(options, Arc::clone(&store))
            .map_err(|err| AppError::identity("identity.client", err))?;
        debug!(storage = %config.storage_path.display(), "dependencies constructed");
        Ok(Self::new(store, Arc::new(client)))
    }

    /// Wiring over caller-supplied store and identity provider.
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            catalog: Arc::new(Catalog::new()),
            identity,
        }
    }

    /// Process-wide preference store.
    #[must_use]
    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    /// Translation catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run the language bootstrap on its own, without mounting the session.
    ///
    /// # Errors
    ///
    /// Returns an error when the localization subsystem fails.
    pub async fn resolve_language(&self) -> AppResult<LanguageCode> {
        let localizer = Arc::clone(&self.catalog);
        LanguageBootstrap::new(localizer, Arc::clone(&self.store))
            .run()
            .await
            .map_err(|err| AppError::bootstrap("bootstrap.run", err))
    }
}

/// Mounted client tree.
pub struct MountedApp {
    scope: Scope,
    gate: LanguageGate,
    language: LanguageCode,
    catalog: Arc<Catalog>,
    session: SessionBridge,
}

impl MountedApp {
    /// Root of the context tree handed to consumers.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Gate that was opened by the bootstrap.
    #[must_use]
    pub const fn gate(&self) -> &LanguageGate {
        &self.gate
    }

    /// Language applied at startup.
    #[must_use]
    pub const fn language(&self) -> LanguageCode {
        self.language
    }

    /// Translation catalog with the startup language active.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Session context resolved through the scope.
    ///
    /// # Errors
    ///
    /// Returns an error when the scope carries no session provider.
    pub fn session(&self) -> AppResult<SessionContext> {
        use_session(&self.scope).map_err(AppError::context)
    }

    /// Release the session subscription.
    pub async fn teardown(self) {
        self.session.teardown().await;
        debug!("application unmounted");
    }
}

/// Run the language bootstrap, then mount the session bridge below it.
///
/// # Errors
///
/// Returns an error when the language bootstrap fails; the session bridge is
/// not mounted in that case.
pub async fn mount(dependencies: &AppDependencies) -> AppResult<MountedApp> {
    let localizer = Arc::clone(&dependencies.catalog);
    let bootstrap = LanguageBootstrap::new(localizer, Arc::clone(&dependencies.store));
    let gate = bootstrap.gate();
    let language = bootstrap
        .run()
        .await
        .map_err(|err| AppError::bootstrap("bootstrap.run", err))?;

    let session = SessionBridge::mount(Arc::clone(&dependencies.identity));
    let scope = Scope::root()
        .provide(Arc::clone(&dependencies.catalog))
        .provide(gate.clone());
    let scope = session.provide(&scope);
    info!(language = %language, "application mounted");

    Ok(MountedApp {
        scope,
        gate,
        language,
        catalog: Arc::clone(&dependencies.catalog),
        session,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use folio_core::{BootstrapPhase, LANGUAGE_STORAGE_KEY, MemoryStore};
    use folio_test_support::{FakeIdentityProvider, sample_session, sample_user};

    fn dependencies(language: Option<&str>, provider: FakeIdentityProvider) -> AppDependencies {
        let store = match language {
            Some(code) => MemoryStore::with_entries([(LANGUAGE_STORAGE_KEY, code)]),
            None => MemoryStore::new(),
        };
        AppDependencies::new(Arc::new(store), Arc::new(provider))
    }

    #[tokio::test]
    async fn mount_opens_gate_and_provides_contexts() -> Result<()> {
        let user = sample_user("admin@example.com");
        let provider = FakeIdentityProvider::new().with_session(sample_session(user.clone()));
        let app = mount(&dependencies(Some("en"), provider)).await?;

        assert_eq!(app.language(), LanguageCode::En);
        assert_eq!(app.gate().phase(), BootstrapPhase::Ready(LanguageCode::En));
        assert!(app.scope().contains::<Arc<Catalog>>());
        assert!(app.scope().contains::<LanguageGate>());
        assert_eq!(app.catalog().text("nav.home", ""), "Home");

        let state = app.session()?.wait_until_loaded().await;
        assert_eq!(state.identity, Some(user));
        app.teardown().await;
        Ok(())
    }

    #[tokio::test]
    async fn resolve_language_leaves_the_session_alone() -> Result<()> {
        let provider = Arc::new(FakeIdentityProvider::new());
        let deps = AppDependencies::new(Arc::new(MemoryStore::new()), provider.clone());
        assert_eq!(deps.resolve_language().await?, LanguageCode::Ca);
        assert_eq!(provider.get_user_calls(), 0);
        assert_eq!(provider.subscriber_count(), 0);
        Ok(())
    }
}
