//! Identity fixtures and environment helpers.

use std::collections::HashMap;

use folio_core::{Session, User};
use uuid::Uuid;

/// User with a fresh id and the given email.
#[must_use]
pub fn sample_user(email: &str) -> User {
    User::with_email(Uuid::new_v4(), email)
}

/// One-hour session for `user` with tokens derived from its id.
#[must_use]
pub fn sample_session(user: User) -> Session {
    Session {
        access_token: format!("access-{}", user.id),
        refresh_token: format!("refresh-{}", user.id),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        expires_at: None,
        user,
    }
}

/// Environment lookup backed by a fixed set of variables.
#[must_use]
pub fn env_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    move |key| values.get(key).cloned()
}
