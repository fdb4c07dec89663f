//! Keyed errors that resolve to a localized status and message and render
//! themselves as API responses

pub mod dispatcher;
pub mod factory;
pub mod fallback;
pub mod keys;
pub mod response;
pub mod structured;

pub use dispatcher::{dispatch_uncaught, panic_response, AppError, ErrorDispatcher, DISPATCHER_TAG};
pub use factory::ErrorFactory;
pub use fallback::{FallbackHandler, FallbackRegistry};
pub use keys::ErrorKey;
pub use response::{ErrorDetail, ErrorResponse, ResponseContext};
pub use structured::{
    resolve, resolve_in, RenderOutcome, Resolved, StructuredError, UNPARSEABLE_STATUS_FALLBACK,
};
