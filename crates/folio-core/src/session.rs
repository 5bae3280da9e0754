//! Session bridge: mirrors the identity provider's session for the rest of the app.
//!
//! # Design
//! - State is a `watch` channel written only by the bridge's two tasks: the
//!   one-shot initial fetch and the notification loop. Consumers get a
//!   read-only `SessionContext`.
//! - The subscription is registered before the fetch is spawned. Whichever of
//!   the two writes lands last wins; nothing sequences them further.
//! - Each notification is applied synchronously. The loop only awaits the
//!   channel itself, never the provider.
//! - Only the fetch clears `loading`, and it always does, success or not.

use std::sync::Arc;

use folio_events::{AuthChange, User};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::context::Scope;
use crate::error::ContextError;
use crate::identity::{
    AuthResponse, AuthSubscription, IdentityProvider, PasswordCredentials, SignOutResponse,
};

/// Identity and loading flag exposed to consumers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    /// Authenticated user, if any.
    pub identity: Option<User>,
    /// `true` until the initial fetch completes.
    pub loading: bool,
}

impl SessionState {
    const fn mounting() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }
}

/// Consumer-facing view of the session plus the sign-in/sign-out actions.
#[derive(Clone)]
pub struct SessionContext {
    state: watch::Receiver<SessionState>,
    provider: Arc<dyn IdentityProvider>,
}

impl SessionContext {
    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Current user, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<User> {
        self.state.borrow().identity.clone()
    }

    /// Whether the initial fetch is still in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Delegate a credential exchange to the provider.
    ///
    /// Local state is untouched; a successful sign-in shows up through the
    /// provider's notification.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResponse {
        let response = self
            .provider
            .sign_in_with_password(PasswordCredentials::new(email, password))
            .await;
        match &response.error {
            None => info!("sign-in accepted"),
            Some(error) => info!(error = %error, code = ?error.code, "sign-in rejected"),
        }
        response
    }

    /// Delegate sign-out to the provider.
    ///
    /// Local state is cleared only by the provider's resulting notification.
    pub async fn sign_out(&self) -> SignOutResponse {
        let response = self.provider.sign_out().await;
        if let Some(error) = &response.error {
            warn!(error = %error, "sign-out failed");
        }
        response
    }

    /// Stream of states, starting with the current one.
    #[must_use]
    pub fn changes(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.state.clone())
    }

    /// Wait for the initial fetch to finish and return the state at that point.
    ///
    /// If the bridge is torn down first, the last known state is returned.
    pub async fn wait_until_loaded(&self) -> SessionState {
        let mut state = self.state.clone();
        let loaded = state
            .wait_for(|current| !current.loading)
            .await
            .map(|current| current.clone());
        loaded.unwrap_or_else(|_| state.borrow().clone())
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SessionContext")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Look up the session context provided above `scope`.
///
/// # Errors
///
/// Returns [`ContextError::MissingProvider`] when no `SessionBridge` context
/// has been provided on the path to the root.
pub fn use_session(scope: &Scope) -> Result<SessionContext, ContextError> {
    scope
        .get::<SessionContext>()
        .ok_or(ContextError::MissingProvider {
            context: "SessionContext",
            provider: "SessionBridge",
        })
}

/// Owner of the session state and of the tasks that write it.
pub struct SessionBridge {
    context: SessionContext,
    shutdown: Option<oneshot::Sender<()>>,
    listener: Option<JoinHandle<()>>,
    fetch: Option<JoinHandle<()>>,
}

impl SessionBridge {
    /// Subscribe to the provider, start the initial fetch, and return the bridge.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn mount(provider: Arc<dyn IdentityProvider>) -> Self {
        let (sender, receiver) = watch::channel(SessionState::mounting());
        let sender = Arc::new(sender);

        let subscription = provider.on_auth_state_change();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let listener = tokio::spawn(listen(subscription, Arc::clone(&sender), shutdown_rx));
        let fetch = tokio::spawn(fetch_initial_user(Arc::clone(&provider), sender));
        debug!("session bridge mounted");

        Self {
            context: SessionContext {
                state: receiver,
                provider,
            },
            shutdown: Some(shutdown),
            listener: Some(listener),
            fetch: Some(fetch),
        }
    }

    /// Handle for consumers.
    #[must_use]
    pub fn context(&self) -> SessionContext {
        self.context.clone()
    }

    /// Child of `scope` that provides this bridge's context.
    #[must_use]
    pub fn provide(&self, scope: &Scope) -> Scope {
        scope.provide(self.context())
    }

    /// Unsubscribe, stop the notification loop, and abandon an in-flight fetch.
    ///
    /// No state change is published after this returns.
    pub async fn teardown(mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
            let _ = fetch.await;
        }
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(listener) = self.listener.take() {
            if let Err(err) = listener.await {
                warn!(error = %err, "session listener join failed");
            }
        }
        info!("session bridge torn down");
    }
}

impl Drop for SessionBridge {
    fn drop(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

async fn listen(
    mut subscription: AuthSubscription,
    state: Arc<watch::Sender<SessionState>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            change = subscription.next() => match change {
                Some(change) => apply_change(&state, &change),
                None => break,
            },
        }
    }
    subscription.unsubscribe();
    debug!("session subscription released");
}

fn apply_change(state: &watch::Sender<SessionState>, change: &AuthChange) {
    let identity = change.user().cloned();
    debug!(
        event = change.event.kind(),
        signed_in = identity.is_some(),
        "session change received"
    );
    state.send_modify(|current| current.identity = identity);
}

async fn fetch_initial_user(
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
) {
    let response = provider.get_user().await;
    if let Some(error) = &response.error {
        debug!(error = %error, "initial user fetch returned no session");
    }
    let signed_in = response.user.is_some();
    state.send_modify(|current| {
        current.identity = response.user;
        current.loading = false;
    });
    debug!(signed_in, "initial user fetch complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounting_state_is_loading_without_identity() {
        let state = SessionState::mounting();
        assert!(state.loading);
        assert!(state.identity.is_none());
        assert!(!SessionState::default().loading);
    }

    #[test]
    fn use_session_outside_provider_is_a_descriptive_error() {
        let err = use_session(&Scope::root()).expect_err("no provider mounted");
        assert_eq!(
            err,
            ContextError::MissingProvider {
                context: "SessionContext",
                provider: "SessionBridge",
            }
        );
        assert!(err.to_string().contains("SessionBridge"));
    }
}
