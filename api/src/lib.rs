//! # SmsVerify API
//!
//! actix-web surface over the verification lifecycle: bearer-token session
//! middleware, route handlers, request/response DTOs and the mapping from
//! domain errors to HTTP responses.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use app::create_app;
pub use state::{build_state, AppState};
