//! Localized message lookup for error keys

pub mod catalog;
pub mod message;
pub mod template;

pub use catalog::{normalize_locale, Catalog, DEFAULT_LOCALE};
pub use message::{parse_text_message, ParsedMessage};
pub use template::{collect_args, render_template, TemplateArg};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocalizationError {
    #[error("localization key not found: {key}")]
    KeyNotFound { key: String },

    #[error("localization key must not be empty")]
    EmptyKey,

    #[error("locale '{locale}' is not present in the catalog")]
    UnknownLocale { locale: String },

    #[error("failed to read catalog at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of localized "status: message" text for an error key
pub trait Localize: Send + Sync {
    /// Text for `key` in the default locale with `args` substituted
    fn localized_text(&self, key: &str, args: &[Option<String>])
        -> Result<String, LocalizationError>;

    /// Text for `key` in `locale`; implementations without locale support
    /// ignore the tag
    fn localized_text_in(
        &self,
        _locale: &str,
        key: &str,
        args: &[Option<String>],
    ) -> Result<String, LocalizationError> {
        self.localized_text(key, args)
    }
}
