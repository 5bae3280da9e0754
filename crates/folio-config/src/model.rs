//! Typed configuration models.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Logging settings handed to the telemetry layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` still wins.
    pub level: String,
    /// `json` or `pretty`; `None` lets the telemetry layer pick.
    pub format: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}

/// Everything the client needs to talk to the identity service and persist state.
#[derive(Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Base URL of the hosted identity project.
    pub identity_url: Url,
    /// Public anonymous API key.
    pub anon_key: String,
    /// Preference-store key for the persisted session.
    pub session_key: String,
    /// JSON file backing the preference store.
    pub storage_path: PathBuf,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Logging settings.
    pub telemetry: TelemetryConfig,
}

impl std::fmt::Debug for SiteConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SiteConfig")
            .field("identity_url", &self.identity_url.as_str())
            .field("anon_key", &"<redacted>")
            .field("session_key", &self.session_key)
            .field("storage_path", &self.storage_path)
            .field("http_timeout", &self.http_timeout)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}
