//! Trait for SMS number provider integration

use async_trait::async_trait;

use super::types::{NumberAssignment, NumberRequestOptions, ProviderStatus};
use crate::errors::ProviderError;

/// Third-party provider renting temporary numbers
///
/// Implementations apply their own HTTP timeouts; the lifecycle service
/// additionally bounds every call with its own deadline.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Rent a number able to receive an SMS from `service`
    async fn request_number(
        &self,
        service: &str,
        country: &str,
        options: &NumberRequestOptions,
    ) -> Result<NumberAssignment, ProviderError>;

    /// Current state of a rented number
    async fn get_status(&self, activation_id: &str) -> Result<ProviderStatus, ProviderError>;

    /// Release a rented number; callers treat failures as best effort
    async fn cancel_number(&self, activation_id: &str) -> Result<(), ProviderError>;

    /// Short provider name for logs
    fn provider_name(&self) -> &str;
}
