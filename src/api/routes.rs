use axum::{middleware, routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{detached_error, health, preview_error, route_not_found, AppState};
use super::middleware::logging_middleware;
use super::openapi::ApiDoc;
use crate::errors::{dispatch_uncaught, panic_response};
use crate::metrics;

pub fn create_router(state: AppState) -> Router {
    let routes = api_routes()
        // OpenAPI documentation
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    with_error_handling(routes, state)
}

/// Service routes without middleware
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/errors/:key", get(preview_error))
        .route("/errors/:key/detached", get(detached_error))
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler))
        .fallback(route_not_found)
}

/// Wrap `routes` with error dispatch and the shared middleware stack
pub fn with_error_handling(routes: Router<AppState>, state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes
        // Order matters (innermost first): panic -> dispatch -> compression ->
        // logging -> metrics -> cors -> trace
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            state.dispatcher.clone(),
            dispatch_uncaught,
        ))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics::middleware::track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
