//! In-memory verification repository used by tests and the in-memory backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{StatusUpdate, Verification, VerificationStatus};
use crate::errors::{DomainError, VerificationError};

use super::traits::{TransitionOutcome, VerificationRepository};

/// Verification store held in process memory
///
/// The conditional status write is a check-and-set under the write lock.
pub struct InMemoryVerificationRepository {
    records: RwLock<HashMap<Uuid, Verification>>,
}

impl InMemoryVerificationRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Overwrite a record directly, bypassing the state machine (test setup)
    pub async fn insert_raw(&self, verification: Verification) {
        self.records
            .write()
            .await
            .insert(verification.id, verification);
    }
}

impl Default for InMemoryVerificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerificationRepository for InMemoryVerificationRepository {
    async fn create(&self, verification: &Verification) -> Result<(), DomainError> {
        let mut records = self.records.write().await;

        if records.contains_key(&verification.id) {
            return Err(VerificationError::DuplicateId {
                id: verification.id,
            }
            .into());
        }

        records.insert(verification.id, verification.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Verification, DomainError> {
        let records = self.records.read().await;
        records
            .get(&id)
            .cloned()
            .ok_or_else(|| VerificationError::NotFound { id }.into())
    }

    async fn find_by_activation_id(
        &self,
        activation_id: &str,
    ) -> Result<Option<Verification>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|v| v.activation_id.as_deref() == Some(activation_id))
            .cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: &[VerificationStatus],
        update: StatusUpdate,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or(VerificationError::NotFound { id })?;

        if !expected.contains(&record.status) {
            return Ok(TransitionOutcome::Conflict(record.clone()));
        }

        record.apply(&update, Utc::now());
        Ok(TransitionOutcome::Applied(record.clone()))
    }

    async fn list_pending_for_user(&self, user_id: Uuid) -> Result<Vec<Verification>, DomainError> {
        let records = self.records.read().await;
        let mut pending: Vec<Verification> = records
            .values()
            .filter(|v| v.user_id == user_id && !v.status.is_terminal())
            .cloned()
            .collect();
        pending.sort_by_key(|v| v.created_at);
        Ok(pending)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Verification>, DomainError> {
        let records = self.records.read().await;
        let mut history: Vec<Verification> = records
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        history.truncate(limit);
        Ok(history)
    }

    async fn list_active(&self, limit: usize) -> Result<Vec<Verification>, DomainError> {
        let records = self.records.read().await;
        let mut active: Vec<Verification> = records
            .values()
            .filter(|v| !v.status.is_terminal())
            .cloned()
            .collect();
        active.sort_by_key(|v| v.created_at);
        active.truncate(limit);
        Ok(active)
    }

    async fn mark_refunded(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or(VerificationError::NotFound { id })?;

        if record.refunded_at.is_some() {
            return Ok(false);
        }

        record.refunded_at = Some(at);
        record.updated_at = at;
        Ok(true)
    }

    async fn record_refund_attempt(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or(VerificationError::NotFound { id })?;

        record.refund_attempts = record.refund_attempts.saturating_add(1);
        record.last_refund_attempt_at = Some(at);
        Ok(())
    }

    async fn list_unsettled_refunds(&self, limit: usize) -> Result<Vec<Verification>, DomainError> {
        let records = self.records.read().await;
        let mut unsettled: Vec<Verification> = records
            .values()
            .filter(|v| v.needs_refund())
            .cloned()
            .collect();
        // None sorts before Some
        unsettled.sort_by_key(|v| (v.last_refund_attempt_at, v.created_at));
        unsettled.truncate(limit);
        Ok(unsettled)
    }
}
