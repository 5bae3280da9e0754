//! Parsing helpers for configuration values.

use std::time::Duration;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

pub(crate) fn require(field: &'static str, value: Option<String>) -> ConfigResult<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingField { field })
}

pub(crate) fn parse_http_url(field: &'static str, raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw).map_err(|_| ConfigError::InvalidField {
        field,
        value: Some(raw.to_string()),
        reason: "not_a_url",
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidField {
            field,
            value: Some(raw.to_string()),
            reason: "unsupported_scheme",
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidField {
            field,
            value: Some(raw.to_string()),
            reason: "missing_host",
        });
    }
    Ok(url)
}

pub(crate) fn parse_timeout_secs(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidField {
        field,
        value: Some(raw.to_string()),
        reason: "not_an_integer",
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidField {
            field,
            value: Some(raw.to_string()),
            reason: "must_be_positive",
        });
    }
    Ok(Duration::from_secs(secs))
}

pub(crate) fn parse_log_format(field: &'static str, raw: &str) -> ConfigResult<String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "json" | "pretty" => Ok(normalized),
        _ => Err(ConfigError::InvalidField {
            field,
            value: Some(raw.to_string()),
            reason: "unsupported_format",
        }),
    }
}

/// `sb-<first host label>-auth-token`, the key the hosted SDKs use.
pub(crate) fn default_session_key(url: &Url) -> String {
    let label = url
        .host_str()
        .and_then(|host| host.split('.').next())
        .filter(|label| !label.is_empty())
        .unwrap_or("local");
    format!("sb-{label}-auth-token")
}
