//! Identity payloads carried on the auth-state bus.
//!
//! The shapes mirror what a GoTrue-compatible identity service returns so the
//! HTTP client can deserialize responses straight into them. Attributes the
//! provider owns (`app_metadata`, `user_metadata`) stay opaque JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier assigned to each auth change published on the bus.
pub type EventId = u64;

/// Default broadcast capacity for the auth-state bus.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Authenticated user record as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Stable identity assigned by the provider.
    pub id: Uuid,
    /// Audience claim for the user's tokens.
    #[serde(default)]
    pub aud: String,
    /// Provider role (`authenticated`, `service_role`, ...).
    #[serde(default)]
    pub role: Option<String>,
    /// Primary email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number, when registered.
    #[serde(default)]
    pub phone: Option<String>,
    /// Provider-managed metadata.
    #[serde(default)]
    pub app_metadata: Value,
    /// User-editable metadata.
    #[serde(default)]
    pub user_metadata: Value,
    /// Account creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Time the email address was confirmed.
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    /// Time of the most recent sign-in.
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl User {
    /// Minimal user record carrying only an identity and an email address.
    #[must_use]
    pub fn with_email(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            aud: "authenticated".to_string(),
            role: Some("authenticated".to_string()),
            email: Some(email.into()),
            phone: None,
            app_metadata: Value::Null,
            user_metadata: Value::Null,
            created_at: None,
            email_confirmed_at: None,
            last_sign_in_at: None,
        }
    }
}

/// Token-bearing session issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Bearer token for authenticated requests.
    pub access_token: String,
    /// Token used to mint a fresh access token.
    pub refresh_token: String,
    /// Token type, normally `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: i64,
    /// Absolute expiry as unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// User the session belongs to.
    pub user: User,
}

impl Session {
    /// Fill `expires_at` from `expires_in` when the provider omitted it.
    #[must_use]
    pub fn with_expiry_from(mut self, now: DateTime<Utc>) -> Self {
        if self.expires_at.is_none() && self.expires_in > 0 {
            self.expires_at = Some(now.timestamp().saturating_add(self.expires_in));
        }
        self
    }

    /// Whether the access token is expired, or within `margin_secs` of expiring,
    /// at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now.timestamp().saturating_add(margin_secs))
    }
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Kinds of session transitions reported by the identity provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    /// Current session replayed to a fresh subscriber.
    InitialSession,
    /// A user signed in.
    SignedIn,
    /// The session ended.
    SignedOut,
    /// The access token was refreshed.
    TokenRefreshed,
    /// User attributes changed.
    UserUpdated,
    /// A password recovery link was followed.
    PasswordRecovery,
}

impl AuthChangeEvent {
    /// Wire name used by the identity provider.
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
        }
    }
}

/// A single auth-state notification: what happened plus the resulting session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthChange {
    /// Transition kind.
    pub event: AuthChangeEvent,
    /// Session after the transition, if any.
    pub session: Option<Session>,
}

impl AuthChange {
    /// Build a notification.
    #[must_use]
    pub const fn new(event: AuthChangeEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }

    /// User embedded in the notification's session.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }
}
