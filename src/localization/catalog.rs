use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::template::render_template;
use super::{LocalizationError, Localize};

const BUILTIN_CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("tr", include_str!("../../locales/tr.json")),
];

pub const DEFAULT_LOCALE: &str = "en";

/// Key to template mapping for every loaded locale
#[derive(Debug, Clone)]
pub struct Catalog {
    default_locale: String,
    locales: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    /// Create an empty catalog with a single (empty) default locale
    pub fn new(default_locale: &str) -> Self {
        let default_locale = normalize_locale(default_locale);
        let mut locales = HashMap::new();
        locales.insert(default_locale.clone(), HashMap::new());

        Self {
            default_locale,
            locales,
        }
    }

    /// Catalogs compiled into the binary, defaulting to English
    pub fn builtin() -> Result<Self, LocalizationError> {
        let mut catalog = Self::new(DEFAULT_LOCALE);

        for (locale, source) in BUILTIN_CATALOGS {
            let entries: HashMap<String, String> =
                serde_json::from_str(source).map_err(|source| LocalizationError::Parse {
                    path: PathBuf::from(format!("<builtin>/{locale}.json")),
                    source,
                })?;
            catalog.extend_locale(locale, entries);
        }

        Ok(catalog)
    }

    /// Load `<locale>.json` files from `dir` on top of the built-in catalogs.
    ///
    /// Files are applied in file-name order. Region files such as
    /// `en-US.json` merge into their language and sort before `en.json`, so
    /// the bare language file wins on conflicting keys.
    pub fn load_dir(dir: &Path, default_locale: &str) -> Result<Self, LocalizationError> {
        let mut catalog = Self::builtin()?;

        let read_dir = fs::read_dir(dir).map_err(|source| LocalizationError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = read_dir
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| LocalizationError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        paths.sort();

        for path in paths {
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let raw = fs::read_to_string(&path).map_err(|source| LocalizationError::Io {
                path: path.clone(),
                source,
            })?;
            let entries: HashMap<String, String> =
                serde_json::from_str(&raw).map_err(|source| LocalizationError::Parse {
                    path: path.clone(),
                    source,
                })?;

            debug!(locale = %locale, keys = entries.len(), path = %path.display(), "Loaded catalog file");
            catalog.extend_locale(locale, entries);
        }

        let catalog = catalog.with_default_locale(default_locale)?;
        info!(
            default_locale = %catalog.default_locale,
            locales = ?catalog.locales(),
            "Localization catalog loaded"
        );
        Ok(catalog)
    }

    /// Switch the default locale; it must already be present
    pub fn with_default_locale(mut self, locale: &str) -> Result<Self, LocalizationError> {
        let locale = normalize_locale(locale);
        if !self.locales.contains_key(&locale) {
            return Err(LocalizationError::UnknownLocale { locale });
        }
        self.default_locale = locale;
        Ok(self)
    }

    /// Merge entries into a locale, overriding existing keys
    pub fn extend_locale(&mut self, locale: &str, entries: HashMap<String, String>) {
        self.locales
            .entry(normalize_locale(locale))
            .or_default()
            .extend(entries);
    }

    pub fn insert(&mut self, locale: &str, key: impl Into<String>, template: impl Into<String>) {
        self.locales
            .entry(normalize_locale(locale))
            .or_default()
            .insert(key.into(), template.into());
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Loaded locale tags, sorted
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.locales
            .get(&self.default_locale)
            .is_some_and(|entries| entries.contains_key(key))
    }

    fn template(&self, locale: &str, key: &str) -> Option<&str> {
        let requested = normalize_locale(locale);
        self.locales
            .get(&requested)
            .and_then(|entries| entries.get(key))
            .or_else(|| {
                self.locales
                    .get(&self.default_locale)
                    .and_then(|entries| entries.get(key))
            })
            .map(String::as_str)
    }
}

impl Localize for Catalog {
    fn localized_text(
        &self,
        key: &str,
        args: &[Option<String>],
    ) -> Result<String, LocalizationError> {
        self.localized_text_in(&self.default_locale, key, args)
    }

    fn localized_text_in(
        &self,
        locale: &str,
        key: &str,
        args: &[Option<String>],
    ) -> Result<String, LocalizationError> {
        if key.is_empty() {
            return Err(LocalizationError::EmptyKey);
        }

        let template = self
            .template(locale, key)
            .ok_or_else(|| LocalizationError::KeyNotFound {
                key: key.to_string(),
            })?;

        Ok(render_template(template, args))
    }
}

/// Reduce a locale tag to its language subtag (`tr-TR` -> `tr`)
pub fn normalize_locale(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}
