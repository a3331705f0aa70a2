//! Bearer token verification settings
//!
//! Tokens are issued by the account service; this server only verifies them.

use serde::{Deserialize, Serialize};

/// Bearer token verification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,

    /// Expected `iss` claim, unchecked when empty
    pub issuer: String,

    /// Allowed clock skew in seconds
    pub leeway_seconds: u64,
}

impl AuthConfig {
    /// Placeholder secret accepted outside production only
    pub const DEVELOPMENT_SECRET: &'static str = "development-secret-change-me";
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Self::DEVELOPMENT_SECRET.to_string(),
            issuer: String::new(),
            leeway_seconds: 30,
        }
    }
}
