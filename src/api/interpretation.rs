use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, MatchedPath},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::ToSchema;

/// Read-only snapshot of how the router interpreted the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RouteInterpretation {
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Route template that matched, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Raw query string, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl RouteInterpretation {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            route: parts
                .extensions
                .get::<MatchedPath>()
                .map(|matched| matched.as_str().to_string()),
            query: parts
                .uri
                .query()
                .filter(|query| !query.is_empty())
                .map(str::to_string),
        }
    }

    pub fn from_request<B>(request: &axum::http::Request<B>) -> Self {
        Self {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            route: request
                .extensions()
                .get::<MatchedPath>()
                .map(|matched| matched.as_str().to_string()),
            query: request
                .uri()
                .query()
                .filter(|query| !query.is_empty())
                .map(str::to_string),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RouteInterpretation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
