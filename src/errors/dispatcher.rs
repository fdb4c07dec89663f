use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{error, warn};

use super::factory::ErrorFactory;
use super::keys::ErrorKey;
use super::response::ResponseContext;
use super::structured::{RenderOutcome, StructuredError};
use crate::api::interpretation::RouteInterpretation;
use crate::api::middleware::RequestId;
use crate::localization::LocalizationError;
use crate::metrics::CONTEXT_SUBSTITUTIONS_TOTAL;

/// Tag passed to the fallback handler for errors caught here
pub const DISPATCHER_TAG: &str = "dispatch_uncaught";

/// Anything a handler can fail with
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Structured(#[from] StructuredError),

    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl From<LocalizationError> for AppError {
    fn from(err: LocalizationError) -> Self {
        Self::Unhandled(err.into())
    }
}

impl AppError {
    /// Wrap a panic payload caught while serving a request
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self::Unhandled(anyhow::anyhow!("handler panicked: {detail}"))
    }
}

/// Parks the error in the response so [`dispatch_uncaught`] can render it
/// with request-scoped state. Without that middleware the client gets a
/// bare 500.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(UncaughtError::new(self));
        response
    }
}

/// Response extension carrying an error that has not been dispatched yet
#[derive(Clone)]
pub struct UncaughtError(Arc<Mutex<Option<AppError>>>);

impl UncaughtError {
    fn new(err: AppError) -> Self {
        Self(Arc::new(Mutex::new(Some(err))))
    }

    /// Take the error out; later calls get `None`
    pub fn take(&self) -> Option<AppError> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Turns uncaught errors into responses.
///
/// Structured errors render themselves; everything else goes to the
/// fallback handler.
#[derive(Debug, Clone)]
pub struct ErrorDispatcher {
    factory: ErrorFactory,
}

impl ErrorDispatcher {
    pub fn new(factory: ErrorFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &ErrorFactory {
        &self.factory
    }

    pub fn dispatch(
        &self,
        err: AppError,
        interpretation: &RouteInterpretation,
        request_id: Option<&RequestId>,
    ) -> Response {
        match err {
            AppError::Structured(err) => self.dispatch_structured(err, interpretation, request_id),
            AppError::Unhandled(err) => self.factory.registry().handle(&err, DISPATCHER_TAG),
        }
    }

    fn dispatch_structured(
        &self,
        err: StructuredError,
        interpretation: &RouteInterpretation,
        request_id: Option<&RequestId>,
    ) -> Response {
        if err.status().is_server_error() {
            error!(
                key = %err.key(),
                status = err.status().as_u16(),
                path = %interpretation.path,
                payload = %err.diagnostic_payload(),
                "Structured error"
            );
        } else {
            warn!(
                key = %err.key(),
                status = err.status().as_u16(),
                path = %interpretation.path,
                payload = %err.diagnostic_payload(),
                "Structured error"
            );
        }

        let original = match err.render() {
            RenderOutcome::Rendered(response) => return response,
            RenderOutcome::MissingContext(original) => original,
        };

        CONTEXT_SUBSTITUTIONS_TOTAL.inc();
        warn!(
            key = %original.key(),
            origin = %original.trace(),
            "No response context attached, rendering substitute error"
        );

        let mut context = ResponseContext::for_interpretation(interpretation);
        if let Some(request_id) = request_id {
            context = context.with_request_id(request_id.as_str());
        }

        match self
            .factory
            .create(ErrorKey::RouterContextNotProvided, [original.key()])
        {
            Ok(substitute) => substitute.render_with(context),
            Err(e) => {
                let err = anyhow::Error::new(e).context(format!(
                    "failed to build substitute error for {}",
                    original.key()
                ));
                self.factory.registry().handle(&err, DISPATCHER_TAG)
            }
        }
    }
}

/// Middleware rendering any [`AppError`] returned by inner handlers
pub async fn dispatch_uncaught(
    State(dispatcher): State<ErrorDispatcher>,
    request: Request,
    next: Next,
) -> Response {
    let interpretation = RouteInterpretation::from_request(&request);
    let request_id = request.extensions().get::<RequestId>().cloned();

    let response = next.run(request).await;

    let Some(uncaught) = response.extensions().get::<UncaughtError>().cloned() else {
        return response;
    };

    match uncaught.take() {
        Some(err) => dispatcher.dispatch(err, &interpretation, request_id.as_ref()),
        None => response,
    }
}

/// Response for a panic caught by the panic layer, handed on as an
/// unhandled error
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    AppError::from_panic(payload).into_response()
}
