use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use utoipa::ToSchema;

use super::interpretation::RouteInterpretation;
use crate::config::Config;
use crate::errors::{
    AppError, ErrorDispatcher, ErrorFactory, ErrorKey, ErrorResponse, FallbackRegistry,
    ResponseContext, StructuredError,
};
use crate::localization::{LocalizationError, Localize};

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub errors: ErrorFactory,
    pub dispatcher: ErrorDispatcher,
    pub instance_id: String,
}

impl AppStateInner {
    pub fn new(config: &Config, localizer: Arc<dyn Localize>) -> Self {
        let errors = ErrorFactory::new(
            localizer,
            Arc::new(FallbackRegistry::new()),
            config.errors.details,
        );

        Self {
            dispatcher: ErrorDispatcher::new(errors.clone()),
            errors,
            instance_id: config.server.instance_id.clone(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Instance identifier
    pub instance_id: String,
    /// Whether diagnostic payloads carry stack and trace
    pub error_details: bool,
    /// Seconds since start
    pub uptime_seconds: u64,
}

/// Positional arguments and locale for an error preview
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ErrorQuery {
    pub args: Vec<String>,
    pub locale: Option<String>,
}

impl ErrorQuery {
    /// Collect repeated `arg` parameters in order; the last `locale` wins
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (name, value) in pairs {
            match name.as_str() {
                "arg" => query.args.push(value),
                "locale" if !value.trim().is_empty() => query.locale = Some(value),
                _ => {}
            }
        }
        query
    }
}

fn build_error(
    errors: &ErrorFactory,
    key: &str,
    query: &ErrorQuery,
) -> Result<StructuredError, LocalizationError> {
    match &query.locale {
        Some(locale) => errors.create_in(locale, key, &query.args),
        None => errors.create(key, &query.args),
    }
}

/// Turn an extractor rejection into a `BAD_REQUEST` error rendered through
/// the same pipeline as every other error
fn bad_request(errors: &ErrorFactory, reason: String, context: ResponseContext) -> AppError {
    debug!(reason = %reason, "Rejected request");
    match errors.create(ErrorKey::BadRequest, [reason]) {
        Ok(err) => err.attach(context).into(),
        Err(e) => e.into(),
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_id: state.instance_id.clone(),
        error_details: state.errors.diagnostics_enabled(),
        uptime_seconds: START_TIME.elapsed().as_secs(),
    })
}

/// Render the catalog entry for a key as an error response
#[utoipa::path(
    get,
    path = "/errors/{key}",
    tag = "errors",
    params(
        ("key" = String, Path, description = "Catalog key, e.g. NOT_FOUND"),
        ("arg" = Option<Vec<String>>, Query, description = "Positional template argument, repeatable"),
        ("locale" = Option<String>, Query, description = "Locale tag, e.g. tr or tr-TR")
    ),
    responses(
        (status = 400, description = "Malformed key or query string", body = ErrorResponse),
        (status = 404, description = "Status declared by the catalog entry", body = ErrorResponse),
        (status = 500, description = "Unknown key", body = ErrorResponse)
    )
)]
pub async fn preview_error(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
    context: ResponseContext,
) -> Result<Response, AppError> {
    let Path(key) = match key {
        Ok(key) => key,
        Err(rejection) => return Err(bad_request(&state.errors, rejection.body_text(), context)),
    };
    let Query(pairs) = match pairs {
        Ok(pairs) => pairs,
        Err(rejection) => return Err(bad_request(&state.errors, rejection.body_text(), context)),
    };

    let query = ErrorQuery::from_pairs(pairs);
    debug!(key = %key, args = ?query.args, locale = ?query.locale, "Previewing error");

    let err = build_error(&state.errors, &key, &query)?;
    Err(err.attach(context).into())
}

/// Same as `/errors/{key}` but raised without a response context
#[utoipa::path(
    get,
    path = "/errors/{key}/detached",
    tag = "errors",
    params(
        ("key" = String, Path, description = "Catalog key, e.g. NOT_FOUND"),
        ("arg" = Option<Vec<String>>, Query, description = "Positional template argument, repeatable"),
        ("locale" = Option<String>, Query, description = "Locale tag")
    ),
    responses(
        (status = 400, description = "Malformed key or query string", body = ErrorResponse),
        (status = 500, description = "Substitute error for the missing response context", body = ErrorResponse)
    )
)]
pub async fn detached_error(
    State(state): State<AppState>,
    key: Result<Path<String>, PathRejection>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
    context: ResponseContext,
) -> Result<Response, AppError> {
    // rejections still carry a context; only the catalog error is detached
    let Path(key) = match key {
        Ok(key) => key,
        Err(rejection) => return Err(bad_request(&state.errors, rejection.body_text(), context)),
    };
    let Query(pairs) = match pairs {
        Ok(pairs) => pairs,
        Err(rejection) => return Err(bad_request(&state.errors, rejection.body_text(), context)),
    };

    let query = ErrorQuery::from_pairs(pairs);
    let err = build_error(&state.errors, &key, &query)?;
    Err(err.into())
}

/// Router fallback for unmatched paths
pub async fn route_not_found(
    State(state): State<AppState>,
    interpretation: RouteInterpretation,
    context: ResponseContext,
) -> AppError {
    match state
        .errors
        .create(ErrorKey::RouteNotFound, [interpretation.path.as_str()])
    {
        Ok(err) => err.attach(context).into(),
        Err(e) => e.into(),
    }
}
