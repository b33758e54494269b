//! Internationalization (i18n) module.
//!
//! Catalogues are embedded with `include_str!` and loaded once by [`init`].

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::warn;

/// LangCode -> catalogue
static TRANSLATIONS: OnceLock<HashMap<&'static str, Value>> = OnceLock::new();

const FALLBACK: &str = "en";

const CATALOGUES: [(&str, &str); 2] = [
    ("en", include_str!("en.json")),
    ("zh", include_str!("zh.json")),
];

/// Load the embedded catalogues. Safe to call more than once.
pub fn init() {
    TRANSLATIONS.get_or_init(|| {
        let mut map = HashMap::new();
        for (lang, raw) in CATALOGUES {
            match serde_json::from_str(raw) {
                Ok(val) => {
                    map.insert(lang, val);
                }
                Err(e) => warn!("Failed to parse {} catalogue: {}", lang, e),
            }
        }
        map
    });
}

/// Get text for a dotted key, e.g. `blockwords.hit`.
///
/// Falls back to English, then to the key itself.
pub fn get_text(lang: &str, key: &str) -> String {
    let Some(store) = TRANSLATIONS.get() else {
        return key.to_string();
    };

    [lang, FALLBACK]
        .iter()
        .filter_map(|l| store.get(*l))
        .find_map(|val| resolve_key(val, key))
        .unwrap_or_else(|| key.to_string())
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(str::to_string)
}

/// Resolve the reply locale.
/// Priority: configured locale, then the user's client language, then English.
pub fn resolve_locale(configured: Option<&str>, user_lang: Option<&str>) -> String {
    configured
        .into_iter()
        .chain(user_lang)
        .filter_map(normalize)
        .next()
        .unwrap_or(FALLBACK)
        .to_string()
}

// "zh-hans" -> "zh"; unknown languages are skipped.
fn normalize(tag: &str) -> Option<&'static str> {
    let primary = tag.split(['-', '_']).next()?.to_ascii_lowercase();
    CATALOGUES
        .iter()
        .map(|(lang, _)| *lang)
        .find(|lang| *lang == primary)
}
