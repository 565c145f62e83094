use std::collections::HashMap;

use serde::Deserialize;

use super::Document;
use super::router::RouterError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Locale {
    pub code: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub icon: Option<String>,
}

impl Locale {
    pub fn new(code: &str) -> Self {
        Locale {
            code: code.to_owned(),
            default: false,
            icon: None,
        }
    }

    pub fn default_locale(code: &str) -> Self {
        Locale {
            default: true,
            ..Locale::new(code)
        }
    }
}

/// One entry of a locale dictionary. Absent fields leave the element untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Translation {
    #[serde(default, alias = "text")]
    pub content: Option<String>,
    #[serde(default, rename = "ariaLabel")]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

pub type Dictionary = HashMap<String, Translation>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleSource {
    Path,
    Stored,
    Browser,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateLink {
    pub hreflang: String,
    pub href: String,
}

/// A validated locale table: non-empty, unique codes, exactly one default.
#[derive(Debug, Clone)]
pub struct Locales {
    locales: Vec<Locale>,
    default: usize,
}

impl Locales {
    pub fn new(locales: Vec<Locale>) -> Result<Self, RouterError> {
        if locales.is_empty() {
            return Err(RouterError::NoLocales);
        }
        for (i, locale) in locales.iter().enumerate() {
            if locales[..i].iter().any(|l| l.code.eq_ignore_ascii_case(&locale.code)) {
                return Err(RouterError::DuplicateLocale(locale.code.clone()));
            }
        }
        let defaults: Vec<usize> = locales
            .iter()
            .enumerate()
            .filter(|(_, l)| l.default)
            .map(|(i, _)| i)
            .collect();
        match defaults.as_slice() {
            [only] => Ok(Locales {
                default: *only,
                locales,
            }),
            other => Err(RouterError::DefaultLocales(other.len())),
        }
    }

    pub fn default_code(&self) -> &str {
        &self.locales[self.default].code
    }

    /// The configured spelling of `code`, matched case-insensitively.
    pub fn find(&self, code: &str) -> Option<&str> {
        self.locales
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
            .map(|l| l.code.as_str())
    }

    /// The locale after `code` in table order, wrapping around.
    pub fn next_after(&self, code: &str) -> &Locale {
        let idx = self
            .locales
            .iter()
            .position(|l| l.code == code)
            .unwrap_or(self.default);
        &self.locales[(idx + 1) % self.locales.len()]
    }

    /// Splits a leading locale segment off `path`.
    ///
    /// `/en/about` gives `(Some("en"), "/about")`; a path whose first segment
    /// is not a configured code comes back unchanged.
    pub fn split_prefix<'p>(&self, path: &'p str) -> (Option<&str>, &'p str) {
        let trimmed = path.trim_start_matches('/');
        let (first, rest) = match trimmed.find('/') {
            Some(i) => (&trimmed[..i], &trimmed[i..]),
            None => (trimmed, ""),
        };
        match self.find(first) {
            Some(code) if !first.is_empty() => (Some(code), rest),
            _ => (None, path),
        }
    }

    pub fn resolve(&self, path: &str, stored: Option<&str>, browser: &[String]) -> (String, LocaleSource) {
        if let (Some(code), _) = self.split_prefix(path) {
            return (code.to_owned(), LocaleSource::Path);
        }
        if let Some(code) = stored.and_then(|s| self.find(s)) {
            return (code.to_owned(), LocaleSource::Stored);
        }
        for tag in browser {
            let primary = tag.split(['-', '_']).next().unwrap_or_default();
            if let Some(code) = self.find(tag).or_else(|| self.find(primary)) {
                return (code.to_owned(), LocaleSource::Browser);
            }
        }
        (self.default_code().to_owned(), LocaleSource::Default)
    }

    /// One alternate link per locale other than `current`, pointing at `route_path`.
    pub fn alternates(&self, current: &str, origin: &str, route_path: &str) -> Vec<AlternateLink> {
        self.locales
            .iter()
            .filter(|l| l.code != current)
            .map(|l| AlternateLink {
                hreflang: l.code.clone(),
                href: format!("{}{}", origin.trim_end_matches('/'), localized(&l.code, route_path)),
            })
            .collect()
    }
}

/// Prefixes a normalized route path (`/about`, or `/` for the root) with a locale.
pub fn localized(code: &str, route_path: &str) -> String {
    match route_path.trim_matches('/') {
        "" => format!("/{}", code),
        rest => format!("/{}/{}", code, rest),
    }
}

pub fn dictionary_url(base: &str, code: &str) -> String {
    format!("{}/{}.json", base.trim_end_matches('/'), code)
}

/// Writes every known translation into the elements marked with `attribute`.
/// Returns how many elements were touched.
pub fn apply_dictionary<D: Document>(doc: &mut D, attribute: &str, dictionary: &Dictionary) -> usize {
    let mut applied = 0;
    for (node, key) in doc.marked(attribute) {
        let Some(entry) = dictionary.get(&key) else {
            tracing::debug!(key = %key, "no translation for element");
            continue;
        };
        if let Some(content) = &entry.content {
            doc.set_content(node, content);
        }
        if let Some(label) = &entry.aria_label {
            doc.set_attribute(node, "aria-label", label);
        }
        if let Some(alt) = &entry.alt {
            doc.set_attribute(node, "alt", alt);
        }
        applied += 1;
    }
    applied
}
