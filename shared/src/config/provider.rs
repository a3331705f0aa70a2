//! SMS number provider configuration

use serde::{Deserialize, Serialize};

/// Which provider implementation to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local fake numbers and codes
    Mock,
    /// TextVerified public API
    #[serde(rename = "textverified")]
    TextVerified,
}

/// Provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider selection
    pub kind: ProviderKind,

    /// API base URL
    pub base_url: String,

    /// API key
    pub api_key: String,

    /// Account username paired with the API key
    pub api_username: String,

    /// HTTP client timeout in seconds
    pub request_timeout_secs: u64,

    /// Polls that report "waiting" before the mock provider delivers a code
    pub mock_polls_before_code: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Mock,
            base_url: String::from("https://www.textverified.com"),
            api_key: String::new(),
            api_username: String::new(),
            request_timeout_secs: 10,
            mock_polls_before_code: 2,
        }
    }
}
