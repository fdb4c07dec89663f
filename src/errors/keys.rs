use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Catalog keys raised by the service itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ErrorKey {
    /// An error reached rendering without a response context
    #[serde(rename = "EXCEPTION_ROUTER_CXT_NOT_PROVIDED")]
    RouterContextNotProvided,

    /// Generic message for errors handled by the fallback handler
    #[serde(rename = "EXCEPTION_UNHANDLED")]
    Unhandled,

    /// No route matched the request
    #[serde(rename = "ROUTE_NOT_FOUND")]
    RouteNotFound,

    /// Request could not be parsed
    #[serde(rename = "BAD_REQUEST")]
    BadRequest,

    /// Resource lookup failed
    #[serde(rename = "NOT_FOUND")]
    NotFound,

    /// Operation did not complete in time
    #[serde(rename = "TIMEOUT")]
    Timeout,
}

impl ErrorKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RouterContextNotProvided => "EXCEPTION_ROUTER_CXT_NOT_PROVIDED",
            Self::Unhandled => "EXCEPTION_UNHANDLED",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ErrorKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
