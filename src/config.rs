use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::localization::DEFAULT_LOCALE;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub errors: ErrorConfig,
    pub localization: LocalizationConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub instance_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ErrorConfig {
    /// Include stack and trace in diagnostic payloads (`ERROR_DETAILS`)
    pub details: bool,
}

#[derive(Debug, Clone)]
pub struct LocalizationConfig {
    pub default_locale: String,
    /// Directory of `<locale>.json` catalogs layered over the built-in ones
    pub locale_dir: Option<PathBuf>,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.to_string(),
            locale_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("API_PORT must be a valid port number")?,
                // Used only for debugging/observability. If unset, fall back to HOSTNAME if
                // present (e.g. Docker/Kubernetes), otherwise "unknown".
                instance_id: env::var("INSTANCE_ID")
                    .or_else(|_| env::var("HOSTNAME"))
                    .unwrap_or_else(|_| "unknown".to_string()),
            },
            errors: ErrorConfig {
                details: match env::var("ERROR_DETAILS") {
                    Ok(raw) => parse_flag(&raw)
                        .with_context(|| format!("ERROR_DETAILS must be a boolean flag, got '{raw}'"))?,
                    Err(_) => false,
                },
            },
            localization: LocalizationConfig {
                default_locale: env::var("DEFAULT_LOCALE")
                    .unwrap_or_else(|_| DEFAULT_LOCALE.to_string()),
                locale_dir: env::var("LOCALE_DIR")
                    .ok()
                    .filter(|dir| !dir.trim().is_empty())
                    .map(PathBuf::from),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Parse a flag: any integer is `n != 0`; `true/false`, `yes/no`, `on/off`
/// are accepted case-insensitively. An empty value counts as off.
pub fn parse_flag(raw: &str) -> Option<bool> {
    let value = raw.trim().to_ascii_lowercase();
    if let Ok(n) = value.parse::<i128>() {
        return Some(n != 0);
    }

    match value.as_str() {
        "" | "false" | "no" | "off" => Some(false),
        "true" | "yes" | "on" => Some(true),
        _ => None,
    }
}
