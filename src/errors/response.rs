use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::interpretation::RouteInterpretation;
use crate::api::middleware::RequestId;

/// Structured error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false for errors
    pub success: bool,
    /// Error details
    pub error: ErrorDetail,
    /// Route snapshot or other content attached to the response context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// HTTP status code
    pub status: u16,
    /// Human-readable error message
    pub message: String,
    /// Request ID for tracing
    pub request_id: String,
}

/// Builder that accumulates status, message and content before a response
/// is emitted.
///
/// `emit` consumes the context, so a context produces at most one response.
#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    status: Option<StatusCode>,
    message: Option<String>,
    content: Option<Value>,
    request_id: Option<String>,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context pre-populated with a snapshot of the current route
    pub fn for_interpretation(interpretation: &RouteInterpretation) -> Self {
        Self::new().with_content(interpretation)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach serializable content. Content that fails to serialize is
    /// dropped with a warning.
    pub fn with_content<T: Serialize + ?Sized>(mut self, content: &T) -> Self {
        match serde_json::to_value(content) {
            Ok(value) => self.content = Some(value),
            Err(e) => warn!(error = %e, "Dropping response content that failed to serialize"),
        }
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn content(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Build the final response body
    pub fn into_body(self) -> (StatusCode, ErrorResponse) {
        let status = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = self
            .message
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string());

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                status: status.as_u16(),
                message,
                request_id: self
                    .request_id
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            },
            content: self.content,
        };

        (status, body)
    }

    /// Emit the accumulated state as an HTTP response
    pub fn emit(self) -> Response {
        let (status, body) = self.into_body();
        (status, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ResponseContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let interpretation = RouteInterpretation::from_parts(parts);
        let context = Self::for_interpretation(&interpretation);

        Ok(match parts.extensions.get::<RequestId>() {
            Some(request_id) => context.with_request_id(request_id.as_str()),
            None => context,
        })
    }
}
