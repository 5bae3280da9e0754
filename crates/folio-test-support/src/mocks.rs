//! In-process fakes for the identity provider and the localization subsystem.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use folio_core::{
    AuthChange, AuthChangeEvent, AuthError, AuthEventBus, AuthResponse, AuthSubscription,
    I18nError, I18nResult, IdentityProvider, LanguageCode, Localizer, PasswordCredentials,
    Session, SignOutResponse, User, UserResponse,
};
use tokio::sync::watch;

use crate::fixtures::sample_session;

/// Identity provider that keeps its session in memory.
///
/// `get_user` snapshots the session when called and only answers once the
/// gate is open, so tests can interleave notifications with a slow fetch.
#[derive(Debug)]
pub struct FakeIdentityProvider {
    bus: AuthEventBus,
    accounts: Mutex<HashMap<String, (String, User)>>,
    session: Mutex<Option<Session>>,
    gate: watch::Sender<bool>,
    get_user_error: Mutex<Option<AuthError>>,
    sign_out_error: Mutex<Option<AuthError>>,
    get_user_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeIdentityProvider {
    /// Provider with no accounts and no session; `get_user` answers immediately.
    #[must_use]
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            bus: AuthEventBus::new(),
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            gate,
            get_user_error: Mutex::new(None),
            sign_out_error: Mutex::new(None),
            get_user_calls: AtomicUsize::new(0),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    /// Register an account that `sign_in_with_password` accepts.
    #[must_use]
    pub fn with_account(self, user: User, password: &str) -> Self {
        if let Some(email) = user.email.clone() {
            lock(&self.accounts).insert(email, (password.to_string(), user));
        }
        self
    }

    /// Start with an existing session.
    #[must_use]
    pub fn with_session(self, session: Session) -> Self {
        *lock(&self.session) = Some(session);
        self
    }

    /// Make `get_user` wait until [`Self::release_get_user`] is called.
    pub fn hold_get_user(&self) {
        self.gate.send_replace(false);
    }

    /// Let held and future `get_user` calls answer.
    pub fn release_get_user(&self) {
        self.gate.send_replace(true);
    }

    /// Make the next `get_user` call fail with `error`.
    pub fn fail_get_user(&self, error: AuthError) {
        *lock(&self.get_user_error) = Some(error);
    }

    /// Make the next `sign_out` call fail with `error`.
    pub fn fail_sign_out(&self, error: AuthError) {
        *lock(&self.sign_out_error) = Some(error);
    }

    /// Replace the stored session without notifying anyone.
    pub fn set_session(&self, session: Option<Session>) {
        *lock(&self.session) = session;
    }

    /// Push a notification to every subscriber.
    pub fn emit(&self, event: AuthChangeEvent, session: Option<Session>) {
        self.bus.publish(AuthChange::new(event, session));
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Calls made to `get_user`.
    #[must_use]
    pub fn get_user_calls(&self) -> usize {
        self.get_user_calls.load(Ordering::SeqCst)
    }

    /// Calls made to `sign_in_with_password`.
    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Calls made to `sign_out`.
    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn current_session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn get_user(&self) -> UserResponse {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.current_session();
        let injected = lock(&self.get_user_error).take();

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if let Some(error) = injected {
            return UserResponse::failure(error);
        }
        match snapshot {
            Some(session) => UserResponse::found(session.user),
            None => UserResponse::failure(AuthError::session_missing()),
        }
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        let initial = AuthChange::new(AuthChangeEvent::InitialSession, self.current_session());
        AuthSubscription::new(self.bus.subscribe_with_initial(initial))
    }

    async fn sign_in_with_password(&self, credentials: PasswordCredentials) -> AuthResponse {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let user = lock(&self.accounts)
            .get(&credentials.email)
            .filter(|(password, _)| *password == credentials.password)
            .map(|(_, user)| user.clone());
        let Some(user) = user else {
            return AuthResponse::failure(AuthError::invalid_credentials());
        };
        let session = sample_session(user);
        self.set_session(Some(session.clone()));
        self.emit(AuthChangeEvent::SignedIn, Some(session.clone()));
        AuthResponse::success(session)
    }

    async fn sign_out(&self) -> SignOutResponse {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.sign_out_error).take() {
            return SignOutResponse::failure(error);
        }
        self.set_session(None);
        self.emit(AuthChangeEvent::SignedOut, None);
        SignOutResponse::ok()
    }
}

/// Localizer that records calls and can be told to fail.
#[derive(Debug, Default)]
pub struct FakeLocalizer {
    initialized: AtomicBool,
    language: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
    fail_init: AtomicBool,
    fail_change: AtomicBool,
}

impl FakeLocalizer {
    /// Uninitialized localizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Localizer that is already initialized with `language` active.
    #[must_use]
    pub fn initialized_with(language: LanguageCode) -> Self {
        let localizer = Self::default();
        localizer.initialized.store(true, Ordering::SeqCst);
        *lock(&localizer.language) = Some(language.code().to_string());
        localizer
    }

    /// Make `init` fail.
    pub fn fail_init(&self) {
        self.fail_init.store(true, Ordering::SeqCst);
    }

    /// Make `change_language` fail.
    pub fn fail_change(&self) {
        self.fail_change.store(true, Ordering::SeqCst);
    }

    /// Calls received so far, e.g. `["init", "change_language:en"]`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl Localizer for FakeLocalizer {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn init(&self) -> I18nResult<()> {
        self.record("init".to_string());
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(I18nError::MissingBundle {
                language: folio_core::DEFAULT_LANGUAGE,
            });
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn language(&self) -> Option<String> {
        lock(&self.language).clone()
    }

    async fn change_language(&self, language: LanguageCode) -> I18nResult<()> {
        self.record(format!("change_language:{}", language.code()));
        if self.fail_change.load(Ordering::SeqCst) {
            return Err(I18nError::MissingBundle { language });
        }
        *lock(&self.language) = Some(language.code().to_string());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
