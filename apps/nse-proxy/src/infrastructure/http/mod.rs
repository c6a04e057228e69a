//! HTTP Surface (Driver Adapter)
//!
//! Axum router exposing the relay routes, the response writer that stamps
//! CORS and content-type headers on every answer, and the listener.

mod error;
mod response_writer;
mod routes;
mod server;

pub use error::{ApiError, ErrorBody};
pub use response_writer::write_response;
pub use routes::{AppState, create_router};
pub use server::{HttpServer, HttpServerError};
