//! Loading `SiteConfig` from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigResult;
use crate::model::{SiteConfig, TelemetryConfig};
use crate::validate::{
    default_session_key, parse_http_url, parse_log_format, parse_timeout_secs, require,
};

/// Identity project base URL (required).
pub const ENV_IDENTITY_URL: &str = "FOLIO_IDENTITY_URL";
/// Public anonymous key (required).
pub const ENV_IDENTITY_ANON_KEY: &str = "FOLIO_IDENTITY_ANON_KEY";
/// Override for the persisted session key.
pub const ENV_SESSION_KEY: &str = "FOLIO_SESSION_KEY";
/// Preference store location.
pub const ENV_STORAGE_PATH: &str = "FOLIO_STORAGE_PATH";
/// HTTP timeout in whole seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "FOLIO_HTTP_TIMEOUT_SECS";
/// Default log directive.
pub const ENV_LOG_LEVEL: &str = "FOLIO_LOG_LEVEL";
/// Log output format.
pub const ENV_LOG_FORMAT: &str = "FOLIO_LOG_FORMAT";

const DEFAULT_STORAGE_PATH: &str = ".folio/storage.json";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

impl SiteConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or any variable
    /// fails validation.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or any variable
    /// fails validation.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let optional = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_url = require(ENV_IDENTITY_URL, lookup(ENV_IDENTITY_URL))?;
        let identity_url = parse_http_url(ENV_IDENTITY_URL, &raw_url)?;
        let anon_key = require(ENV_IDENTITY_ANON_KEY, lookup(ENV_IDENTITY_ANON_KEY))?;

        let session_key =
            optional(ENV_SESSION_KEY).unwrap_or_else(|| default_session_key(&identity_url));
        let storage_path = optional(ENV_STORAGE_PATH)
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);
        let http_timeout = optional(ENV_HTTP_TIMEOUT_SECS)
            .map(|raw| parse_timeout_secs(ENV_HTTP_TIMEOUT_SECS, &raw))
            .transpose()?
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);

        let mut telemetry = TelemetryConfig::default();
        if let Some(level) = optional(ENV_LOG_LEVEL) {
            telemetry.level = level;
        }
        telemetry.format = optional(ENV_LOG_FORMAT)
            .map(|raw| parse_log_format(ENV_LOG_FORMAT, &raw))
            .transpose()?;

        let config = Self {
            identity_url,
            anon_key,
            session_key,
            storage_path,
            http_timeout,
            telemetry,
        };
        debug!(?config, "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use anyhow::Result;
    use folio_test_support::env_lookup;

    const URL: (&str, &str) = (ENV_IDENTITY_URL, "https://abcdefgh.supabase.co");
    const KEY: (&str, &str) = (ENV_IDENTITY_ANON_KEY, "anon-key");

    #[test]
    fn minimal_environment_uses_defaults() -> Result<()> {
        let config = SiteConfig::from_lookup(env_lookup(&[URL, KEY]))?;
        assert_eq!(config.identity_url.as_str(), "https://abcdefgh.supabase.co/");
        assert_eq!(config.session_key, "sb-abcdefgh-auth-token");
        assert_eq!(config.storage_path, PathBuf::from(".folio/storage.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.telemetry, TelemetryConfig::default());
        Ok(())
    }

    #[test]
    fn overrides_are_applied() -> Result<()> {
        let config = SiteConfig::from_lookup(env_lookup(&[
            URL,
            KEY,
            (ENV_SESSION_KEY, "custom-key"),
            (ENV_STORAGE_PATH, "/var/lib/folio/state.json"),
            (ENV_HTTP_TIMEOUT_SECS, "3"),
            (ENV_LOG_LEVEL, "folio=debug"),
            (ENV_LOG_FORMAT, "JSON"),
        ]))?;
        assert_eq!(config.session_key, "custom-key");
        assert_eq!(config.storage_path, PathBuf::from("/var/lib/folio/state.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.telemetry.level, "folio=debug");
        assert_eq!(config.telemetry.format.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn missing_required_values_are_named() {
        let err = SiteConfig::from_lookup(env_lookup(&[KEY])).unwrap_err();
        assert_eq!(err, ConfigError::MissingField { field: ENV_IDENTITY_URL });
        let err = SiteConfig::from_lookup(env_lookup(&[URL, (ENV_IDENTITY_ANON_KEY, "")]))
            .unwrap_err();
        assert_eq!(err.field(), ENV_IDENTITY_ANON_KEY);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            (ENV_HTTP_TIMEOUT_SECS, "0"),
            (ENV_LOG_FORMAT, "xml"),
        ];
        for (field, value) in cases {
            let err = SiteConfig::from_lookup(env_lookup(&[URL, KEY, (field, value)]))
                .unwrap_err();
            assert_eq!(err.field(), field);
        }
        let err = SiteConfig::from_lookup(env_lookup(&[(ENV_IDENTITY_URL, "file:///tmp"), KEY]))
            .unwrap_err();
        assert_eq!(err.field(), ENV_IDENTITY_URL);
    }

    #[test]
    fn debug_output_redacts_the_anon_key() -> Result<()> {
        let config = SiteConfig::from_lookup(env_lookup(&[URL, KEY]))?;
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("anon-key"));
        Ok(())
    }
}
