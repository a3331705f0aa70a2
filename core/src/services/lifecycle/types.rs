//! Types for lifecycle requests, provider results and batch outcomes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::Verification;
use crate::domain::value_objects::Money;

/// Request to purchase a verification number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVerificationRequest {
    pub service_name: String,
    pub country: String,
    /// Preferred area code, when the provider supports it
    pub area_code: Option<String>,
    /// Preferred carrier, when the provider supports it
    pub carrier: Option<String>,
}

impl CreateVerificationRequest {
    pub fn new(service_name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            country: country.into(),
            area_code: None,
            carrier: None,
        }
    }
}

/// Optional provider hints for a number request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberRequestOptions {
    pub area_code: Option<String>,
    pub carrier: Option<String>,
}

/// A rented number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberAssignment {
    /// Provider correlation ID
    pub activation_id: String,
    pub phone_number: String,
    /// What the provider charged
    pub cost: Money,
}

/// Provider-side state of a rented number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderState {
    Waiting,
    Received,
    Expired,
    Cancelled,
}

/// Result of a provider status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub state: ProviderState,
    pub sms_code: Option<String>,
    pub sms_text: Option<String>,
}

impl ProviderStatus {
    pub fn waiting() -> Self {
        Self {
            state: ProviderState::Waiting,
            sms_code: None,
            sms_text: None,
        }
    }

    pub fn received(code: impl Into<String>, text: Option<String>) -> Self {
        Self {
            state: ProviderState::Received,
            sms_code: Some(code.into()),
            sms_text: text,
        }
    }

    pub fn expired() -> Self {
        Self {
            state: ProviderState::Expired,
            sms_code: None,
            sms_text: None,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            state: ProviderState::Cancelled,
            sms_code: None,
            sms_text: None,
        }
    }
}

/// A record that could not be polled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollFailure {
    pub verification_id: Uuid,
    pub error: String,
}

/// Result of polling several records independently
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollBatchResult {
    /// Every record that could be loaded, in its post-poll state
    pub results: Vec<Verification>,
    /// Per-record provider or storage errors
    pub errors: Vec<PollFailure>,
}

impl PollBatchResult {
    /// Records that ended this poll in a terminal state
    pub fn terminal_count(&self) -> usize {
        self.results.iter().filter(|v| v.is_terminal()).count()
    }
}

/// Aggregate result of an admin bulk cancel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkCancelResult {
    pub cancelled_count: usize,
    pub total_refunded: Money,
}

/// Result of a refund reconciliation sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileResult {
    /// Unsettled records examined
    pub examined: usize,
    /// Refunds credited by this sweep
    pub refunded: usize,
    /// Records whose refund had already been credited; only the stamp was missing
    pub already_applied: usize,
    /// Records still unsettled after this sweep
    pub failed: usize,
}
