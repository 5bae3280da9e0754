//! GoTrue client implementing the identity-provider contract.
//!
//! # Design
//! - The session lives in memory and is mirrored into the preference store
//!   under the configured session key, so it survives restarts.
//! - Every session transition is published on the auth bus; subscribers get
//!   `INITIAL_SESSION` first.
//! - Remote failures come back as `AuthError` data. Nothing is retried.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use folio_core::{
    AuthChange, AuthChangeEvent, AuthError, AuthEventBus, AuthResponse, AuthSubscription,
    IdentityProvider, PasswordCredentials, PreferenceStore, Session, SignOutResponse, User,
    UserResponse,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{IdentityError, IdentityResult};
use crate::wire::{PasswordGrant, RefreshGrant, parse_error};

/// Seconds before expiry at which an access token is refreshed.
pub const EXPIRY_MARGIN_SECS: i64 = 30;

const HEADER_API_KEY: &str = "apikey";

/// Connection settings for [`GoTrueClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Project base URL; REST paths are joined below `auth/v1/`.
    pub base_url: Url,
    /// Public anonymous key sent as `apikey`.
    pub anon_key: String,
    /// Preference-store key holding the persisted session.
    pub session_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Identity provider backed by a GoTrue REST endpoint.
pub struct GoTrueClient {
    http: Client,
    auth_base: Url,
    session_key: String,
    store: Arc<dyn PreferenceStore>,
    bus: AuthEventBus,
    session: RwLock<Option<Session>>,
}

impl GoTrueClient {
    /// Build a client and restore any persisted session.
    ///
    /// A persisted session that cannot be decoded is discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot carry paths, the anon key is
    /// not a valid header value, or the HTTP client cannot be built.
    pub fn new(options: ClientOptions, store: Arc<dyn PreferenceStore>) -> IdentityResult<Self> {
        let auth_base = auth_base(&options.base_url)?;

        let mut default_headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&options.anon_key)
            .map_err(|_| IdentityError::InvalidAnonKey)?;
        default_headers.insert(HEADER_API_KEY, api_key);

        let http = Client::builder()
            .timeout(options.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|source| IdentityError::HttpClient { source })?;

        let restored = match restore_session(store.as_ref(), &options.session_key) {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, key = %options.session_key, "discarding persisted session");
                None
            }
        };
        debug!(restored = restored.is_some(), "identity client ready");

        Ok(Self {
            http,
            auth_base,
            session_key: options.session_key,
            store,
            bus: AuthEventBus::new(),
            session: RwLock::new(restored),
        })
    }

    /// Session currently held by the client.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bus carrying this client's session transitions.
    #[must_use]
    pub const fn bus(&self) -> &AuthEventBus {
        &self.bus
    }

    fn endpoint(&self, path: &str, grant_type: Option<&str>) -> Url {
        let mut url = self.auth_base.clone();
        url.set_path(&format!("{}{path}", self.auth_base.path()));
        if let Some(grant_type) = grant_type {
            url.query_pairs_mut().append_pair("grant_type", grant_type);
        }
        url
    }

    fn store_session(&self, session: Session, event: AuthChangeEvent) {
        if let Err(err) = persist_session(self.store.as_ref(), &self.session_key, &session) {
            warn!(error = %err, "session kept in memory only");
        }
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        self.bus.publish(AuthChange::new(event, Some(session)));
    }

    fn clear_session(&self) {
        if let Err(source) = self.store.remove(&self.session_key) {
            let err = IdentityError::Store {
                operation: "session.remove",
                source,
            };
            warn!(error = %err, "persisted session not removed");
        }
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.bus.publish(AuthChange::new(AuthChangeEvent::SignedOut, None));
    }

    async fn token_request<T: serde::Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &T,
    ) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.endpoint("token", Some(grant_type)))
            .json(body)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let session = response
            .json::<Session>()
            .await
            .map_err(|err| transport_error(&err))?;
        Ok(session.with_expiry_from(Utc::now()))
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let grant = RefreshGrant {
            refresh_token: &session.refresh_token,
        };
        match self.token_request("refresh_token", &grant).await {
            Ok(refreshed) => {
                debug!("access token refreshed");
                self.store_session(refreshed.clone(), AuthChangeEvent::TokenRefreshed);
                Ok(refreshed)
            }
            Err(err) => {
                if err.status.is_some() {
                    info!(error = %err, "refresh rejected; signing out");
                    self.clear_session();
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn get_user(&self) -> UserResponse {
        let Some(session) = self.current_session() else {
            return UserResponse::failure(AuthError::session_missing());
        };
        let session = if session.is_expired_at(Utc::now(), EXPIRY_MARGIN_SECS) {
            match self.refresh(&session).await {
                Ok(refreshed) => refreshed,
                Err(err) => return UserResponse::failure(err),
            }
        } else {
            session
        };

        let response = match self
            .http
            .get(self.endpoint("user", None))
            .bearer_auth(&session.access_token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return UserResponse::failure(transport_error(&err)),
        };
        if !response.status().is_success() {
            return UserResponse::failure(error_from_response(response).await);
        }
        match response.json::<User>().await {
            Ok(user) => UserResponse::found(user),
            Err(err) => UserResponse::failure(transport_error(&err)),
        }
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        let initial = AuthChange::new(AuthChangeEvent::InitialSession, self.current_session());
        AuthSubscription::new(self.bus.subscribe_with_initial(initial))
    }

    async fn sign_in_with_password(&self, credentials: PasswordCredentials) -> AuthResponse {
        let grant = PasswordGrant {
            email: &credentials.email,
            password: &credentials.password,
        };
        match self.token_request("password", &grant).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "signed in");
                self.store_session(session.clone(), AuthChangeEvent::SignedIn);
                AuthResponse::success(session)
            }
            Err(err) => AuthResponse::failure(err),
        }
    }

    async fn sign_out(&self) -> SignOutResponse {
        let Some(session) = self.current_session() else {
            self.clear_session();
            return SignOutResponse::ok();
        };
        let result = self
            .http
            .post(self.endpoint("logout", None))
            .bearer_auth(&session.access_token)
            .send()
            .await;
        match result {
            Ok(response)
                if response.status().is_success()
                    || matches!(
                        response.status(),
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
                    ) =>
            {
                info!(status = %response.status(), "signed out");
                self.clear_session();
                SignOutResponse::ok()
            }
            Ok(response) => SignOutResponse::failure(error_from_response(response).await),
            Err(err) => SignOutResponse::failure(transport_error(&err)),
        }
    }
}

fn auth_base(base_url: &Url) -> IdentityResult<Url> {
    if base_url.cannot_be_a_base() {
        return Err(IdentityError::InvalidBaseUrl {
            value: base_url.to_string(),
        });
    }
    let mut auth_base = base_url.clone();
    let prefix = base_url.path().trim_end_matches('/');
    auth_base.set_path(&format!("{prefix}/auth/v1/"));
    auth_base.set_query(None);
    Ok(auth_base)
}

fn restore_session(store: &dyn PreferenceStore, key: &str) -> IdentityResult<Option<Session>> {
    let raw = store.get(key).map_err(|source| IdentityError::Store {
        operation: "session.read",
        source,
    })?;
    raw.map(|raw| {
        serde_json::from_str(&raw).map_err(|source| IdentityError::SessionCodec {
            key: key.to_string(),
            source,
        })
    })
    .transpose()
}

fn persist_session(
    store: &dyn PreferenceStore,
    key: &str,
    session: &Session,
) -> IdentityResult<()> {
    let encoded = serde_json::to_string(session).map_err(|source| IdentityError::SessionCodec {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &encoded).map_err(|source| IdentityError::Store {
        operation: "session.write",
        source,
    })
}

async fn error_from_response(response: reqwest::Response) -> AuthError {
    let status = response.status().as_u16();
    let body = response.bytes().await.unwrap_or_default();
    parse_error(status, &body)
}

fn transport_error(err: &reqwest::Error) -> AuthError {
    AuthError::new(
        format!("identity request failed: {err}"),
        None,
        Some("network_error"),
    )
}
