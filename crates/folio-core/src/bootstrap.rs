//! One-shot language bootstrap and the gate that holds rendering until it finishes.
//!
//! # Design
//! - `LanguageBootstrap::run` consumes the bootstrap, so resolution can only
//!   happen once per mount.
//! - The phase lives in a `watch` channel owned by the bootstrap; gates only
//!   read it. The phase moves `Pending -> Ready` and never back.
//! - Failures are returned to the caller unchanged. The gate keeps showing the
//!   placeholder and `wait_ready` resolves to `None`.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{BootstrapError, BootstrapResult};
use crate::i18n::Localizer;
use crate::language::{LanguageCode, resolve_language};
use crate::preferences::{PreferenceStore, load_language_preference};

/// Static content shown while the bootstrap is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadingPlaceholder {
    /// Whether a spinner accompanies the text.
    pub spinner: bool,
    /// Status text. Localization is not ready yet, so this is never translated.
    pub text: &'static str,
}

/// The placeholder rendered before the language is resolved.
pub const LOADING_PLACEHOLDER: LoadingPlaceholder = LoadingPlaceholder {
    spinner: true,
    text: "Loading...",
};

/// Observable progress of the bootstrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// Still resolving; render the placeholder.
    Pending,
    /// Finished with the given active language; render children.
    Ready(LanguageCode),
}

/// Resolves and applies the UI language once at startup.
pub struct LanguageBootstrap {
    localizer: Arc<dyn Localizer>,
    store: Arc<dyn PreferenceStore>,
    phase: watch::Sender<BootstrapPhase>,
}

impl LanguageBootstrap {
    /// Bootstrap over the given localization subsystem and preference store.
    #[must_use]
    pub fn new(localizer: Arc<dyn Localizer>, store: Arc<dyn PreferenceStore>) -> Self {
        let (phase, _) = watch::channel(BootstrapPhase::Pending);
        Self {
            localizer,
            store,
            phase,
        }
    }

    /// Read-only view of the bootstrap progress.
    #[must_use]
    pub fn gate(&self) -> LanguageGate {
        LanguageGate {
            phase: self.phase.subscribe(),
        }
    }

    /// Resolve the effective language, apply it, and open the gate.
    ///
    /// # Errors
    ///
    /// Returns an error when initializing the localizer or switching the
    /// language fails. Nothing is retried.
    pub async fn run(self) -> BootstrapResult<LanguageCode> {
        if !self.localizer.is_initialized() {
            debug!("initializing localization subsystem");
            self.localizer
                .init()
                .await
                .map_err(|source| BootstrapError::LocalizerInit { source })?;
        }

        let stored = load_language_preference(self.store.as_ref());
        let target = resolve_language(stored.as_deref());
        debug!(stored = ?stored, target = %target, "language preference resolved");

        if self.localizer.language().as_deref() != Some(target.code()) {
            self.localizer
                .change_language(target)
                .await
                .map_err(|source| BootstrapError::LanguageSwitch {
                    language: target,
                    source,
                })?;
        }

        self.phase.send_if_modified(|phase| match phase {
            BootstrapPhase::Pending => {
                *phase = BootstrapPhase::Ready(target);
                true
            }
            BootstrapPhase::Ready(_) => false,
        });
        info!(language = %target, "language bootstrap complete");
        Ok(target)
    }
}

/// Read-only handle that decides between the placeholder and the children.
#[derive(Clone, Debug)]
pub struct LanguageGate {
    phase: watch::Receiver<BootstrapPhase>,
}

impl LanguageGate {
    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> BootstrapPhase {
        *self.phase.borrow()
    }

    /// Whether children may render.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.phase(), BootstrapPhase::Ready(_))
    }

    /// Render the placeholder while pending, the children once ready.
    pub fn render<T>(
        &self,
        placeholder: impl FnOnce(&LoadingPlaceholder) -> T,
        children: impl FnOnce(LanguageCode) -> T,
    ) -> T {
        match self.phase() {
            BootstrapPhase::Pending => placeholder(&LOADING_PLACEHOLDER),
            BootstrapPhase::Ready(language) => children(language),
        }
    }

    /// Wait until the bootstrap completes.
    ///
    /// Returns `None` if the bootstrap was dropped or failed before completing.
    pub async fn wait_ready(&mut self) -> Option<LanguageCode> {
        let phase = self
            .phase
            .wait_for(|phase| matches!(phase, BootstrapPhase::Ready(_)))
            .await
            .ok()
            .map(|phase| *phase);
        match phase {
            Some(BootstrapPhase::Ready(language)) => Some(language),
            _ => None,
        }
    }
}
