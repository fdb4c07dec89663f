mod logging;

pub use logging::{logging_middleware, RequestId, REQUEST_ID_HEADER};
