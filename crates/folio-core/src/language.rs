//! Supported UI languages and persisted-preference resolution.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Key under which the preferred language is persisted.
pub const LANGUAGE_STORAGE_KEY: &str = "i18nextLng";

/// Language used when no supported preference is stored.
pub const DEFAULT_LANGUAGE: LanguageCode = LanguageCode::Ca;

/// Languages the site ships translations for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    /// English.
    En,
    /// Spanish.
    Es,
    /// Catalan.
    Ca,
}

impl LanguageCode {
    /// All supported languages in display order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Ca, Self::Es, Self::En]
    }

    /// Two-letter code stored in preferences and passed to the localizer.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Ca => "ca",
        }
    }

    /// Endonym shown in the language switcher.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Español",
            Self::Ca => "Català",
        }
    }

    /// Exact, case-sensitive match against the supported codes.
    ///
    /// Region-qualified tags such as `en-US` are not members of the set.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|language| language.code() == value)
    }
}

impl Display for LanguageCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.code())
    }
}

/// Pick the effective language from a persisted preference.
///
/// Only the stored value is consulted; browser or OS locale never participates.
#[must_use]
pub fn resolve_language(stored: Option<&str>) -> LanguageCode {
    stored
        .and_then(LanguageCode::parse)
        .unwrap_or(DEFAULT_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_values_resolve_to_themselves() {
        for language in LanguageCode::all() {
            assert_eq!(resolve_language(Some(language.code())), language);
        }
    }

    #[test]
    fn absent_or_unsupported_values_resolve_to_catalan() {
        for stored in [None, Some(""), Some("fr"), Some("EN"), Some("en-US"), Some(" es")] {
            assert_eq!(resolve_language(stored), LanguageCode::Ca, "stored={stored:?}");
        }
    }

    #[test]
    fn display_uses_code() {
        assert_eq!(LanguageCode::Es.to_string(), "es");
        assert_eq!(LanguageCode::Ca.label(), "Català");
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        let json = serde_json::to_string(&LanguageCode::En).expect("serialize");
        assert_eq!(json, "\"en\"");
    }
}
