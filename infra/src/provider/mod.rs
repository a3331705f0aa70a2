//! SMS Number Provider Module
//!
//! Implementations of the core's `SmsProvider` trait for renting temporary
//! numbers and reading the codes they receive.
//!
//! ## Providers
//!
//! - **TextVerified**: production provider over its HTTP API
//! - **Mock**: fake numbers and codes for development

use std::sync::Arc;

use sv_core::services::lifecycle::SmsProvider;
use sv_shared::config::{ProviderConfig, ProviderKind};

pub mod mock_provider;
pub mod textverified;

pub use mock_provider::MockSmsProvider;
pub use textverified::{TextVerifiedConfig, TextVerifiedProvider};


/// Create a provider based on configuration
///
/// Falls back to the mock provider with a warning when the TextVerified
/// client cannot be built (missing credentials, TLS setup failure).
pub fn create_provider(config: &ProviderConfig) -> Arc<dyn SmsProvider> {
    match config.kind {
        ProviderKind::Mock => {
            tracing::info!(
                "Using mock SMS provider (code after {} polls)",
                config.mock_polls_before_code
            );
            Arc::new(MockSmsProvider::new(config.mock_polls_before_code))
        }
        ProviderKind::TextVerified => {
            let provider = TextVerifiedConfig::from_provider_config(config)
                .and_then(TextVerifiedProvider::new);

            match provider {
                Ok(provider) => Arc::new(provider),
                Err(e) => {
                    tracing::error!("Failed to initialize TextVerified provider: {}", e);
                    tracing::warn!("Falling back to mock SMS provider");
                    Arc::new(MockSmsProvider::new(config.mock_polls_before_code))
                }
            }
        }
    }
}
