//! Message catalog for the user-facing strings of the message view.
//!
//! Bundles are compiled in and keyed by their English source text. A locale
//! such as `fr_BE.UTF-8` resolves to the `fr_be` bundle, then `fr`, and any
//! key a bundle lacks falls back to English.

use std::collections::HashMap;
use std::env;

/// Locale every other bundle falls back to.
pub const FALLBACK_LOCALE: &str = "en";

const BUNDLES: &[(&str, &str)] = &[
    ("en", include_str!("../i18n/en.json")),
    ("es", include_str!("../i18n/es.json")),
    ("fr", include_str!("../i18n/fr.json")),
];

/// Localized strings keyed by their English source text.
#[derive(Clone, Debug)]
pub struct Catalog {
    locale: String,
    messages: HashMap<String, String>,
}

impl Catalog {
    /// Load the catalog for the locale detected from the environment.
    pub fn detect() -> Self {
        Self::load(&detect_locale())
    }

    /// Load the bundle best matching `locale` over the English one.
    pub fn load(locale: &str) -> Self {
        let locale = normalize_locale(locale).unwrap_or_else(|| FALLBACK_LOCALE.to_string());
        let mut messages = parse_bundle(FALLBACK_LOCALE);
        match resolve_bundle(&locale) {
            Some(bundle) if bundle != FALLBACK_LOCALE => messages.extend(parse_bundle(bundle)),
            Some(_) => {}
            None => tracing::debug!("No catalog for locale {}, using English", locale),
        }
        Self { locale, messages }
    }

    /// Build a catalog from explicit messages.
    pub fn with_messages(locale: &str, messages: HashMap<String, String>) -> Self {
        Self {
            locale: locale.to_string(),
            messages,
        }
    }

    /// Normalized locale the catalog was requested for.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Translate a source string; unknown keys translate to themselves.
    pub fn t(&self, key: &str) -> String {
        self.messages.get(key).map_or(key, String::as_str).to_string()
    }

    /// Translate and substitute `{param}` placeholders.
    pub fn format(&self, key: &str, params: &[(&str, &str)]) -> String {
        params
            .iter()
            .fold(self.t(key), |text, (param, replacement)| {
                text.replace(&format!("{{{param}}}"), replacement)
            })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::load(FALLBACK_LOCALE)
    }
}

/// Locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, normalized to `xx_yy`.
pub fn detect_locale() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|key| env::var(key).ok())
        .find_map(|value| normalize_locale(&value))
        .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
}

/// `fr-BE.UTF-8@euro` becomes `fr_be`; `C` and `POSIX` mean English.
pub fn normalize_locale(raw: &str) -> Option<String> {
    let name = raw
        .trim()
        .split(|c| c == '.' || c == '@')
        .next()
        .unwrap_or_default()
        .replace('-', "_")
        .to_lowercase();
    match name.as_str() {
        "" => None,
        "c" | "posix" => Some(FALLBACK_LOCALE.to_string()),
        _ => Some(name),
    }
}

/// Name of the bundle serving `locale`: an exact match, else its language.
fn resolve_bundle(locale: &str) -> Option<&'static str> {
    let language = locale.split('_').next().unwrap_or(locale);
    [locale, language].into_iter().find_map(|candidate| {
        BUNDLES
            .iter()
            .find(|(name, _)| *name == candidate)
            .map(|(name, _)| *name)
    })
}

fn parse_bundle(name: &str) -> HashMap<String, String> {
    let Some((_, raw)) = BUNDLES.iter().find(|(bundle, _)| *bundle == name) else {
        return HashMap::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!("Invalid {} catalog: {}", name, e);
        HashMap::new()
    })
}
