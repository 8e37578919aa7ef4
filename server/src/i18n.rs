//! Locale catalog: language tag -> key/value tree.
//!
//! Lookup is by dot-separated path with a two-stage fallback: the default
//! language tree, then the lookup key itself. No pluralization or
//! interpolation; values are plain strings.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;

pub const DEFAULT_LANG: &str = "en";
pub const SUPPORTED_LANGS: [&str; 3] = ["en", "fr", "ar"];

/// Text direction for a language tag.
pub fn direction(lang: &str) -> &'static str {
    if lang.eq_ignore_ascii_case("ar") {
        "rtl"
    } else {
        "ltr"
    }
}

pub struct Catalog {
    trees: HashMap<&'static str, Value>,
}

impl Catalog {
    /// Loads the locale trees shipped with the server binary.
    pub fn load_embedded() -> Result<Self> {
        let sources: [(&'static str, &str); 3] = [
            ("en", include_str!("../locales/en.json")),
            ("fr", include_str!("../locales/fr.json")),
            ("ar", include_str!("../locales/ar.json")),
        ];

        let mut trees = HashMap::new();
        for (lang, raw) in sources {
            let tree: Value = serde_json::from_str(raw)
                .with_context(|| format!("invalid locale file for '{lang}'"))?;
            trees.insert(lang, tree);
        }
        Ok(Self { trees })
    }

    /// Maps an arbitrary language tag to a supported one, falling back to
    /// the default language.
    pub fn resolve_lang(&self, lang: &str) -> &'static str {
        SUPPORTED_LANGS
            .iter()
            .find(|l| lang.eq_ignore_ascii_case(l))
            .copied()
            .unwrap_or(DEFAULT_LANG)
    }

    /// The full message tree for a (resolved) language.
    pub fn tree(&self, lang: &str) -> &Value {
        self.trees
            .get(self.resolve_lang(lang))
            .unwrap_or(&Value::Null)
    }

    /// Dot-path lookup in the given language, falling back to the default
    /// language tree when the key is absent.
    pub fn lookup(&self, lang: &str, key: &str) -> Option<&Value> {
        let resolved = self.resolve_lang(lang);
        get_by_path(self.tree(resolved), key).or_else(|| {
            if resolved == DEFAULT_LANG {
                None
            } else {
                get_by_path(self.tree(DEFAULT_LANG), key)
            }
        })
    }

    /// String for a key, falling back to the key itself when missing in all
    /// trees.
    pub fn text(&self, lang: &str, key: &str) -> String {
        self.text_or(lang, key, key)
    }

    /// String for a key with a caller-supplied fallback.
    pub fn text_or(&self, lang: &str, key: &str, fallback: &str) -> String {
        match self.lookup(lang, key) {
            Some(Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => fallback.to_string(),
        }
    }
}

fn get_by_path<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return None;
    }
    let mut current = tree;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}
