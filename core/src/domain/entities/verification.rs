//! Verification entity: one purchase of a temporary number for one service.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::Money;

/// Lifecycle state of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl VerificationStatus {
    /// Non-terminal states, the ones a poll or cancel may leave
    pub const ACTIVE: [VerificationStatus; 2] =
        [VerificationStatus::Pending, VerificationStatus::Processing];

    /// Convert to string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Terminal states that give the charged cost back
    pub fn is_refundable(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: VerificationStatus) -> bool {
        match self {
            Self::Pending => next != Self::Pending,
            Self::Processing => next.is_terminal(),
            Self::Completed | Self::Failed | Self::Cancelled => false,
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown verification status: {}", other)),
        }
    }
}

/// Verification record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Unique identifier, generated at creation
    pub id: Uuid,

    /// Owner of the record
    pub user_id: Uuid,

    /// Target service, lowercase ("whatsapp", "telegram")
    pub service_name: String,

    /// ISO 3166-1 alpha-2 country code
    pub country: String,

    /// Assigned number, absent until the provider assigns one
    pub phone_number: Option<String>,

    pub status: VerificationStatus,

    /// Price charged to the user, fixed at creation
    pub cost: Money,

    /// What the provider charged for the number
    pub provider_cost: Option<Money>,

    /// Provider correlation ID
    pub activation_id: Option<String>,

    pub sms_code: Option<String>,
    pub sms_text: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set when the record reaches a terminal state
    pub completed_at: Option<DateTime<Utc>>,

    /// Set once the refund for this record has been applied
    pub refunded_at: Option<DateTime<Utc>>,

    /// Refund calls that errored for this record
    #[serde(default)]
    pub refund_attempts: u32,

    /// When the last erroring refund call was made
    #[serde(default)]
    pub last_refund_attempt_at: Option<DateTime<Utc>>,
}

impl Verification {
    /// Creates a new pending verification
    pub fn new(
        user_id: Uuid,
        service_name: impl Into<String>,
        country: impl Into<String>,
        cost: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            service_name: service_name.into(),
            country: country.into(),
            phone_number: None,
            status: VerificationStatus::Pending,
            cost,
            provider_cost: None,
            activation_id: None,
            sms_code: None,
            sms_text: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            refunded_at: None,
            refund_attempts: 0,
            last_refund_attempt_at: None,
        }
    }

    /// Attach the provider's number assignment
    pub fn with_assignment(
        mut self,
        activation_id: impl Into<String>,
        phone_number: impl Into<String>,
        provider_cost: Option<Money>,
    ) -> Self {
        self.activation_id = Some(activation_id.into());
        self.phone_number = Some(phone_number.into());
        self.provider_cost = provider_cost;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the record has outlived `max_lifetime` at `now`
    pub fn is_expired(&self, now: DateTime<Utc>, max_lifetime: Duration) -> bool {
        now - self.created_at >= max_lifetime
    }

    /// Whether a refund is owed and not yet recorded
    pub fn needs_refund(&self) -> bool {
        self.status.is_refundable() && !self.cost.is_zero() && self.refunded_at.is_none()
    }

    /// Apply a status update at `now`
    ///
    /// Merge fields are only overwritten when the update carries a value.
    /// Moving into a terminal state stamps `completed_at` if the update
    /// does not provide one.
    pub fn apply(&mut self, update: &StatusUpdate, now: DateTime<Utc>) {
        self.status = update.status;

        if let Some(code) = &update.sms_code {
            self.sms_code = Some(code.clone());
        }
        if let Some(text) = &update.sms_text {
            self.sms_text = Some(text.clone());
        }
        if let Some(completed_at) = update.completed_at {
            self.completed_at = Some(completed_at);
        } else if update.status.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }

        self.updated_at = now;
    }
}

/// Status change plus the fields merged alongside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: VerificationStatus,
    pub sms_code: Option<String>,
    pub sms_text: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    pub fn to(status: VerificationStatus) -> Self {
        Self {
            status,
            sms_code: None,
            sms_text: None,
            completed_at: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>, text: Option<String>) -> Self {
        self.sms_code = Some(code.into());
        self.sms_text = text;
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }
}
