pub mod auth;
pub mod cors;

pub use auth::{AccessClaims, AuthContext, JwtAuth, TokenVerifier};
pub use cors::create_cors;
