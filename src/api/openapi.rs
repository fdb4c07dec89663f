use utoipa::OpenApi;

use crate::api::handlers::HealthResponse;
use crate::api::interpretation::RouteInterpretation;
use crate::errors::{ErrorDetail, ErrorKey, ErrorResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Localized Errors",
        version = "0.1.0",
        description = "Keyed, localized error responses. Catalog entries of the form \"<status>: <message>\" are resolved into an HTTP status and a message and rendered as JSON.",
        contact(
            name = "Localized Errors API",
        )
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::preview_error,
        crate::api::handlers::detached_error,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            ErrorDetail,
            ErrorKey,
            RouteInterpretation,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "errors", description = "Catalog error rendering"),
    )
)]
pub struct ApiDoc;
