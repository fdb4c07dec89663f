use axum::http::StatusCode;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

use super::fallback::{FallbackHandler, FallbackRegistry, GENERIC_FAILURE_MESSAGE};
use super::keys::ErrorKey;
use super::response::ResponseContext;
use super::structured::{resolve, StructuredError};
use crate::localization::{collect_args, LocalizationError, Localize, TemplateArg};

/// Builds [`StructuredError`]s against one catalog and fallback registry
#[derive(Clone)]
pub struct ErrorFactory {
    localizer: Arc<dyn Localize>,
    registry: Arc<FallbackRegistry>,
    diagnostics: bool,
}

impl fmt::Debug for ErrorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorFactory")
            .field("registry", &self.registry)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl ErrorFactory {
    pub fn new(
        localizer: Arc<dyn Localize>,
        registry: Arc<FallbackRegistry>,
        diagnostics: bool,
    ) -> Self {
        Self {
            localizer,
            registry,
            diagnostics,
        }
    }

    pub fn registry(&self) -> &Arc<FallbackRegistry> {
        &self.registry
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics
    }

    /// Create an error for `key` in the default locale
    #[track_caller]
    pub fn create<K, I>(&self, key: K, args: I) -> Result<StructuredError, LocalizationError>
    where
        K: AsRef<str>,
        I: IntoIterator,
        I::Item: Into<TemplateArg>,
    {
        self.ensure_fallback();
        StructuredError::build(
            self.localizer.as_ref(),
            None,
            key.as_ref(),
            collect_args(args),
            self.diagnostics,
        )
    }

    /// Create an error for a key whose template takes no arguments
    #[track_caller]
    pub fn create_simple<K: AsRef<str>>(&self, key: K) -> Result<StructuredError, LocalizationError> {
        self.ensure_fallback();
        StructuredError::build(
            self.localizer.as_ref(),
            None,
            key.as_ref(),
            Vec::new(),
            self.diagnostics,
        )
    }

    /// Create an error for `key` in `locale`, falling back to the default
    /// locale for missing entries
    #[track_caller]
    pub fn create_in<K, I>(
        &self,
        locale: &str,
        key: K,
        args: I,
    ) -> Result<StructuredError, LocalizationError>
    where
        K: AsRef<str>,
        I: IntoIterator,
        I::Item: Into<TemplateArg>,
    {
        self.ensure_fallback();
        StructuredError::build(
            self.localizer.as_ref(),
            Some(locale),
            key.as_ref(),
            collect_args(args),
            self.diagnostics,
        )
    }

    fn ensure_fallback(&self) {
        let localizer = self.localizer.clone();
        if self
            .registry
            .install_default_with(|| localized_default_handler(localizer))
        {
            debug!("Installed default fallback error handler");
        }
    }
}

/// Default handler answering with the catalog's `EXCEPTION_UNHANDLED` entry
pub fn localized_default_handler(localizer: Arc<dyn Localize>) -> FallbackHandler {
    Arc::new(move |err: &anyhow::Error, tag: &str| {
        error!(dispatcher = %tag, error = ?err, "Unhandled error");

        let (status, message) = match resolve(localizer.as_ref(), ErrorKey::Unhandled.as_str(), &[]) {
            Ok(resolved) => (resolved.status, resolved.message),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_FAILURE_MESSAGE.to_string(),
            ),
        };

        ResponseContext::new()
            .with_status(status)
            .with_message(message)
            .emit()
    })
}
