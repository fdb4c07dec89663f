pub mod handlers;
pub mod interpretation;
pub mod middleware;
pub mod openapi;
pub mod routes;
