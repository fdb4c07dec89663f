use axum::{http::StatusCode, response::Response};
use serde_json::{json, Value};
use std::backtrace::Backtrace;
use std::panic::Location;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::response::ResponseContext;
use crate::localization::{
    collect_args, parse_text_message, LocalizationError, Localize, TemplateArg,
};
use crate::metrics::STRUCTURED_ERRORS_RENDERED_TOTAL;

/// Status used when localized text carries no parseable status prefix
pub const UNPARSEABLE_STATUS_FALLBACK: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

/// Status and message resolved from a catalog key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub status: StatusCode,
    pub message: String,
}

/// Look up `key` in the default locale and split it into status and message
pub fn resolve(
    localizer: &dyn Localize,
    key: &str,
    args: &[Option<String>],
) -> Result<Resolved, LocalizationError> {
    let declared = localizer.localized_text(key, &[])?;
    let text = localizer.localized_text(key, args)?;
    Ok(split_resolved(&declared, &text))
}

/// Same as [`resolve`] for an explicit locale
pub fn resolve_in(
    localizer: &dyn Localize,
    locale: &str,
    key: &str,
    args: &[Option<String>],
) -> Result<Resolved, LocalizationError> {
    let declared = localizer.localized_text_in(locale, key, &[])?;
    let text = localizer.localized_text_in(locale, key, args)?;
    Ok(split_resolved(&declared, &text))
}

/// The status comes from the template alone, so arguments can never inject
/// or change it. `declared` is the template rendered without arguments.
fn split_resolved(declared: &str, text: &str) -> Resolved {
    let Some(status) = parse_text_message(declared).status else {
        return Resolved {
            status: UNPARSEABLE_STATUS_FALLBACK,
            message: text.to_string(),
        };
    };

    let parsed = parse_text_message(text);
    let message = if parsed.status == Some(status) {
        parsed.message
    } else {
        text.to_string()
    };

    Resolved { status, message }
}

/// Result of asking an error to render itself
#[derive(Debug)]
pub enum RenderOutcome {
    /// The attached context produced a response
    Rendered(Response),
    /// No context was attached; the error is handed back untouched
    MissingContext(StructuredError),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

/// An error identified by a catalog key, resolved to an HTTP status and a
/// localized message at construction time.
///
/// Status and message never change after construction. Rendering consumes
/// the error, so each instance yields at most one response.
#[derive(Debug, Error)]
#[error("{}: {}", .status.as_u16(), .message)]
pub struct StructuredError {
    key: String,
    args: Vec<Option<String>>,
    status: StatusCode,
    message: String,
    context: Option<ResponseContext>,
    origin: &'static Location<'static>,
    stack: Option<String>,
    diagnostics: bool,
}

impl StructuredError {
    /// Resolve `key` with `args` against `localizer`.
    ///
    /// Diagnostics are off; use [`ErrorFactory`](super::ErrorFactory) to
    /// honour the configured flag.
    #[track_caller]
    pub fn new<I>(localizer: &dyn Localize, key: &str, args: I) -> Result<Self, LocalizationError>
    where
        I: IntoIterator,
        I::Item: Into<TemplateArg>,
    {
        Self::build(localizer, None, key, collect_args(args), false)
    }

    #[track_caller]
    pub(crate) fn build(
        localizer: &dyn Localize,
        locale: Option<&str>,
        key: &str,
        args: Vec<Option<String>>,
        diagnostics: bool,
    ) -> Result<Self, LocalizationError> {
        let origin = Location::caller();

        let resolved = match locale {
            Some(locale) => resolve_in(localizer, locale, key, &args)?,
            None => resolve(localizer, key, &args)?,
        };

        let stack = if diagnostics {
            Some(Backtrace::force_capture().to_string())
        } else {
            None
        };

        Ok(Self {
            key: key.to_string(),
            args,
            status: resolved.status,
            message: resolved.message,
            context: None,
            origin,
            stack,
            diagnostics,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn args(&self) -> &[Option<String>] {
        &self.args
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Attach the context this error renders through
    pub fn attach(mut self, context: ResponseContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Render through the attached context, or hand the error back when
    /// none was attached
    pub fn render(mut self) -> RenderOutcome {
        match self.context.take() {
            Some(context) => RenderOutcome::Rendered(self.render_with(context)),
            None => RenderOutcome::MissingContext(self),
        }
    }

    /// Render through `context`, ignoring any attached one
    pub fn render_with(self, context: ResponseContext) -> Response {
        debug!(
            key = %self.key,
            status = self.status.as_u16(),
            origin = %self.trace(),
            "Rendering structured error"
        );

        STRUCTURED_ERRORS_RENDERED_TOTAL
            .with_label_values(&[self.key.as_str(), self.status.as_str()])
            .inc();

        context
            .with_status(self.status)
            .with_message(self.message)
            .emit()
    }

    /// `"<file stem>: <line>"` of the construction site
    pub fn trace(&self) -> String {
        let file = self.origin.file();
        let stem = Path::new(file)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(file);
        format!("{}: {}", stem, self.origin.line())
    }

    /// Payload for logs and operators. Stack and trace are included only
    /// when diagnostics were enabled at construction.
    pub fn diagnostic_payload(&self) -> Value {
        let mut payload = json!({ "errMessage": self.message });

        if self.diagnostics {
            payload["errDetails"] = json!({
                "Stack": self.stack.as_deref().unwrap_or_default(),
                "Trace": self.trace(),
            });
        }

        payload
    }
}
