//! GoTrue request and error bodies.

use folio_core::AuthError;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub(crate) email: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub(crate) refresh_token: &'a str,
}

/// Error payloads vary across GoTrue versions; every field is optional.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_auth_error(self, status: u16) -> AuthError {
        let message = self
            .msg
            .or(self.error_description)
            .or(self.message)
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("identity request failed with status {status}"));
        let code = self.error_code.or(self.error);
        AuthError {
            message,
            status: Some(status),
            code,
        }
    }
}

/// Build an [`AuthError`] from a non-success response body.
pub(crate) fn parse_error(status: u16, body: &[u8]) -> AuthError {
    serde_json::from_slice::<ErrorBody>(body)
        .unwrap_or_default()
        .into_auth_error(status)
}
