//! Verification repository trait defining the interface for record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{StatusUpdate, Verification, VerificationStatus};
use crate::errors::DomainError;

/// Result of a conditional status write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The stored status matched; carries the updated record
    Applied(Verification),
    /// The stored status did not match; carries the record as stored
    Conflict(Verification),
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn into_verification(self) -> Verification {
        match self {
            Self::Applied(v) | Self::Conflict(v) => v,
        }
    }
}

/// Repository trait for Verification persistence operations
///
/// `update_status` is the only write path to `status`. Records are never
/// physically deleted.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Insert a new record
    ///
    /// # Returns
    /// * `Err(DomainError::Verification(DuplicateId))` - ID already stored
    async fn create(&self, verification: &Verification) -> Result<(), DomainError>;

    /// Load a record by ID
    ///
    /// # Returns
    /// * `Err(DomainError::Verification(NotFound))` - No such record
    async fn get(&self, id: Uuid) -> Result<Verification, DomainError>;

    /// Find a record by the provider's correlation ID
    async fn find_by_activation_id(
        &self,
        activation_id: &str,
    ) -> Result<Option<Verification>, DomainError>;

    /// Apply `update` only if the stored status is one of `expected`
    ///
    /// The check and the write happen atomically; two callers racing on the
    /// same record cannot both get `Applied`.
    async fn update_status(
        &self,
        id: Uuid,
        expected: &[VerificationStatus],
        update: StatusUpdate,
    ) -> Result<TransitionOutcome, DomainError>;

    /// A user's `pending` and `processing` records, oldest first
    async fn list_pending_for_user(&self, user_id: Uuid) -> Result<Vec<Verification>, DomainError>;

    /// A user's records, newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Verification>, DomainError>;

    /// Non-terminal records across all users, oldest first
    async fn list_active(&self, limit: usize) -> Result<Vec<Verification>, DomainError>;

    /// Stamp `refunded_at` if it is not set yet
    ///
    /// # Returns
    /// * `Ok(true)` - The stamp was written by this call
    /// * `Ok(false)` - It was already set
    async fn mark_refunded(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError>;

    /// Count an erroring refund call and stamp `last_refund_attempt_at`
    async fn record_refund_attempt(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Failed or cancelled records with a non-zero cost and no refund stamp
    ///
    /// Records never attempted come first, oldest first; then records whose
    /// last refund attempt is the oldest. A refund that keeps failing moves
    /// to the back instead of holding the head of the queue.
    async fn list_unsettled_refunds(&self, limit: usize) -> Result<Vec<Verification>, DomainError>;
}
