//! Identity-provider contract consumed by the session bridge.
//!
//! Provider outcomes are data, not errors: sign-in and sign-out hand back the
//! provider's result object and callers inspect its `error` field.

use async_trait::async_trait;
use folio_events::{AuthChange, AuthEventStream, Session, User};
use serde::{Deserialize, Serialize};

/// Email/password pair submitted to the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

impl PasswordCredentials {
    /// Build a credential pair.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PasswordCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Error descriptor returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthError {
    /// Human-readable message from the provider.
    pub message: String,
    /// HTTP status, when the failure came from a response.
    #[serde(default)]
    pub status: Option<u16>,
    /// Machine-readable code (`invalid_credentials`, `session_not_found`, ...).
    #[serde(default)]
    pub code: Option<String>,
}

impl AuthError {
    /// Build an error descriptor.
    #[must_use]
    pub fn new(message: impl Into<String>, status: Option<u16>, code: Option<&str>) -> Self {
        Self {
            message: message.into(),
            status,
            code: code.map(ToString::to_string),
        }
    }

    /// Descriptor for a call that needs a session when none exists.
    #[must_use]
    pub fn session_missing() -> Self {
        Self::new("auth session missing", None, Some("session_missing"))
    }

    /// Descriptor for rejected credentials.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::new(
            "Invalid login credentials",
            Some(400),
            Some("invalid_credentials"),
        )
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.message)
    }
}

/// Payload of a successful sign-in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthData {
    /// Signed-in user.
    pub user: Option<User>,
    /// Issued session.
    pub session: Option<Session>,
}

/// Raw result of a credential exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Session data, empty on failure.
    pub data: AuthData,
    /// Failure descriptor, `None` on success.
    pub error: Option<AuthError>,
}

impl AuthResponse {
    /// Successful exchange.
    #[must_use]
    pub fn success(session: Session) -> Self {
        Self {
            data: AuthData {
                user: Some(session.user.clone()),
                session: Some(session),
            },
            error: None,
        }
    }

    /// Failed exchange.
    #[must_use]
    pub fn failure(error: AuthError) -> Self {
        Self {
            data: AuthData::default(),
            error: Some(error),
        }
    }

    /// Whether the exchange succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Raw result of a "get current user" call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    /// Current user, if any.
    pub user: Option<User>,
    /// Failure descriptor.
    pub error: Option<AuthError>,
}

impl UserResponse {
    /// Call succeeded with `user`.
    #[must_use]
    pub const fn found(user: User) -> Self {
        Self {
            user: Some(user),
            error: None,
        }
    }

    /// Call failed.
    #[must_use]
    pub const fn failure(error: AuthError) -> Self {
        Self {
            user: None,
            error: Some(error),
        }
    }
}

/// Raw result of a sign-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOutResponse {
    /// Failure descriptor, `None` on success.
    pub error: Option<AuthError>,
}

impl SignOutResponse {
    /// Successful sign-out.
    #[must_use]
    pub const fn ok() -> Self {
        Self { error: None }
    }

    /// Failed sign-out.
    #[must_use]
    pub const fn failure(error: AuthError) -> Self {
        Self { error: Some(error) }
    }
}

/// Live registration on the provider's session-change stream.
///
/// Dropping the subscription or calling [`AuthSubscription::unsubscribe`]
/// detaches it; no notification is delivered afterwards.
pub struct AuthSubscription {
    stream: Option<AuthEventStream>,
}

impl AuthSubscription {
    /// Wrap a bus stream.
    #[must_use]
    pub const fn new(stream: AuthEventStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Next notification, or `None` once unsubscribed or the provider is gone.
    pub async fn next(&mut self) -> Option<AuthChange> {
        let stream = self.stream.as_mut()?;
        stream.next().await.map(|envelope| envelope.change)
    }

    /// Detach from the provider.
    pub fn unsubscribe(&mut self) {
        self.stream = None;
    }

    /// Whether the subscription is still attached.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

/// Hosted identity service as seen by the client.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the user for the current session.
    async fn get_user(&self) -> UserResponse;

    /// Register for session-change notifications.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// Exchange an email/password pair for a session.
    async fn sign_in_with_password(&self, credentials: PasswordCredentials) -> AuthResponse;

    /// End the current session.
    async fn sign_out(&self) -> SignOutResponse;
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_events::{AuthChangeEvent, AuthEventBus};

    #[test]
    fn credentials_debug_redacts_password() {
        let credentials = PasswordCredentials::new("admin@example.com", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("admin@example.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn failure_response_carries_no_session() {
        let response = AuthResponse::failure(AuthError::invalid_credentials());
        assert!(!response.is_ok());
        assert!(response.data.session.is_none());
        assert_eq!(
            response.error.and_then(|err| err.code).as_deref(),
            Some("invalid_credentials")
        );
    }

    #[tokio::test]
    async fn unsubscribe_detaches_from_bus() {
        let bus = AuthEventBus::new();
        let mut subscription = AuthSubscription::new(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(AuthChange::new(AuthChangeEvent::SignedOut, None));
        let change = subscription.next().await.expect("delivered");
        assert_eq!(change.event, AuthChangeEvent::SignedOut);

        subscription.unsubscribe();
        assert!(!subscription.is_active());
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(AuthChange::new(AuthChangeEvent::SignedOut, None));
        assert!(subscription.next().await.is_none());
    }
}
