//! Audit log entity for recording verification lifecycle and billing events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::domain::value_objects::Money;

/// Event types recorded by the lifecycle service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    // Creation events
    VerificationCreated,
    CreationCompensated,

    // Status transitions
    VerificationProcessing,
    VerificationCompleted,
    VerificationFailed,
    VerificationCancelled,

    // Billing events
    CreditsRefunded,
    RefundFailed,

    // Admin events
    BulkCancel,
}

impl AuditEventType {
    /// Convert to string representation for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerificationCreated => "VERIFICATION_CREATED",
            Self::CreationCompensated => "CREATION_COMPENSATED",
            Self::VerificationProcessing => "VERIFICATION_PROCESSING",
            Self::VerificationCompleted => "VERIFICATION_COMPLETED",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::VerificationCancelled => "VERIFICATION_CANCELLED",
            Self::CreditsRefunded => "CREDITS_REFUNDED",
            Self::RefundFailed => "REFUND_FAILED",
            Self::BulkCancel => "BULK_CANCEL",
        }
    }

    /// Whether the event signals something an operator should look at
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CreationCompensated | Self::RefundFailed)
    }
}

/// An audit log entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLog {
    pub id: Uuid,

    pub event_type: AuditEventType,

    /// Owner of the affected record or balance
    pub user_id: Option<Uuid>,

    pub verification_id: Option<Uuid>,

    /// Administrator who performed the action, when it was not the owner
    pub actor_id: Option<Uuid>,

    /// Amount debited, credited or refunded
    pub amount: Option<Money>,

    /// Additional event data
    pub details: JsonValue,

    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// Create a new audit log entry
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            user_id: None,
            verification_id: None,
            actor_id: None,
            amount: None,
            details: JsonValue::Object(Map::new()),
            created_at: Utc::now(),
        }
    }

    /// Add user context to the audit log
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_verification(mut self, verification_id: Uuid) -> Self {
        self.verification_id = Some(verification_id);
        self
    }

    /// Record the acting administrator; ignored when the actor is the owner
    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        if self.user_id != Some(actor_id) {
            self.actor_id = Some(actor_id);
        }
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Add a single detail field
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        if let JsonValue::Object(map) = &mut self.details {
            map.insert(key.into(), value.into());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&AuditEventType::CreditsRefunded).unwrap();
        assert_eq!(json, "\"CREDITS_REFUNDED\"");
        assert_eq!(AuditEventType::BulkCancel.as_str(), "BULK_CANCEL");
    }

    #[test]
    fn test_builder_collects_context() {
        let user_id = Uuid::new_v4();
        let verification_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();

        let log = AuditLog::new(AuditEventType::VerificationCancelled)
            .with_user(user_id)
            .with_verification(verification_id)
            .with_actor(admin_id)
            .with_amount(Money::parse("1.00").unwrap())
            .with_detail("reason", "admin bulk cancel");

        assert_eq!(log.user_id, Some(user_id));
        assert_eq!(log.verification_id, Some(verification_id));
        assert_eq!(log.actor_id, Some(admin_id));
        assert_eq!(log.details["reason"], "admin bulk cancel");
    }

    #[test]
    fn test_owner_is_not_recorded_as_actor() {
        let user_id = Uuid::new_v4();
        let log = AuditLog::new(AuditEventType::VerificationCancelled)
            .with_user(user_id)
            .with_actor(user_id);
        assert!(log.actor_id.is_none());
    }

    #[test]
    fn test_failure_events() {
        assert!(AuditEventType::RefundFailed.is_failure());
        assert!(AuditEventType::CreationCompensated.is_failure());
        assert!(!AuditEventType::CreditsRefunded.is_failure());
    }
}
