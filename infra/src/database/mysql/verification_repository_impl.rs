//! MySQL implementation of the VerificationRepository trait.
//!
//! Status changes go through a single `UPDATE ... WHERE status IN (...)`;
//! the affected-row count decides whether the caller won the transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

use sv_core::domain::entities::{StatusUpdate, Verification, VerificationStatus};
use sv_core::errors::{DomainError, VerificationError};
use sv_core::repositories::{TransitionOutcome, VerificationRepository};

use super::rows::{db_error, row_to_verification, VERIFICATION_COLUMNS};

/// MySQL implementation of VerificationRepository
pub struct MySqlVerificationRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlVerificationRepository {
    /// Create a new MySQL verification repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(&self, id: Uuid) -> Result<Option<Verification>, DomainError> {
        let query = format!("SELECT {} FROM verifications WHERE id = ?", VERIFICATION_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load verification"))?;

        row.as_ref().map(row_to_verification).transpose()
    }

    async fn fetch_all(
        &self,
        query: &str,
        binds: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<Verification>, DomainError> {
        let mut q = sqlx::query(query);
        for value in binds {
            q = q.bind(value);
        }
        if let Some(limit) = limit {
            q = q.bind(limit as u64);
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list verifications"))?;

        rows.iter().map(row_to_verification).collect()
    }
}

/// `?, ?, ?` for `count` bind parameters
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[async_trait]
impl VerificationRepository for MySqlVerificationRepository {
    async fn create(&self, verification: &Verification) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO verifications (
                id, user_id, service_name, country, phone_number, status, cost,
                provider_cost, activation_id, sms_code, sms_text, created_at,
                updated_at, completed_at, refunded_at, refund_attempts,
                last_refund_attempt_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(verification.id.to_string())
            .bind(verification.user_id.to_string())
            .bind(&verification.service_name)
            .bind(&verification.country)
            .bind(&verification.phone_number)
            .bind(verification.status.as_str())
            .bind(verification.cost.amount())
            .bind(verification.provider_cost.map(|cost| cost.amount()))
            .bind(&verification.activation_id)
            .bind(&verification.sms_code)
            .bind(&verification.sms_text)
            .bind(verification.created_at)
            .bind(verification.updated_at)
            .bind(verification.completed_at)
            .bind(verification.refunded_at)
            .bind(verification.refund_attempts)
            .bind(verification.last_refund_attempt_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(VerificationError::DuplicateId { id: verification.id }.into())
            }
            Err(e) => Err(db_error("Failed to create verification")(e)),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Verification, DomainError> {
        self.fetch_optional(id)
            .await?
            .ok_or_else(|| VerificationError::NotFound { id }.into())
    }

    async fn find_by_activation_id(
        &self,
        activation_id: &str,
    ) -> Result<Option<Verification>, DomainError> {
        let query = format!(
            "SELECT {} FROM verifications WHERE activation_id = ? LIMIT 1",
            VERIFICATION_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(activation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find verification by activation"))?;

        row.as_ref().map(row_to_verification).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: &[VerificationStatus],
        update: StatusUpdate,
    ) -> Result<TransitionOutcome, DomainError> {
        if expected.is_empty() {
            return Ok(TransitionOutcome::Conflict(self.get(id).await?));
        }

        let now = Utc::now();
        let completed_at = update
            .completed_at
            .or_else(|| update.status.is_terminal().then_some(now));

        let query = format!(
            r#"
            UPDATE verifications
            SET status = ?,
                sms_code = COALESCE(?, sms_code),
                sms_text = COALESCE(?, sms_text),
                completed_at = COALESCE(completed_at, ?),
                updated_at = ?
            WHERE id = ? AND status IN ({})
            "#,
            placeholders(expected.len())
        );

        let mut q = sqlx::query(&query)
            .bind(update.status.as_str())
            .bind(&update.sms_code)
            .bind(&update.sms_text)
            .bind(completed_at)
            .bind(now)
            .bind(id.to_string());
        for status in expected {
            q = q.bind(status.as_str());
        }

        let result = q
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update verification status"))?;

        let stored = self.get(id).await?;
        if result.rows_affected() == 1 {
            Ok(TransitionOutcome::Applied(stored))
        } else {
            Ok(TransitionOutcome::Conflict(stored))
        }
    }

    async fn list_pending_for_user(&self, user_id: Uuid) -> Result<Vec<Verification>, DomainError> {
        let query = format!(
            "SELECT {} FROM verifications \
             WHERE user_id = ? AND status IN ('pending', 'processing') \
             ORDER BY created_at ASC",
            VERIFICATION_COLUMNS
        );
        self.fetch_all(&query, &[user_id.to_string()], None).await
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Verification>, DomainError> {
        let query = format!(
            "SELECT {} FROM verifications WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
            VERIFICATION_COLUMNS
        );
        self.fetch_all(&query, &[user_id.to_string()], Some(limit))
            .await
    }

    async fn list_active(&self, limit: usize) -> Result<Vec<Verification>, DomainError> {
        let query = format!(
            "SELECT {} FROM verifications \
             WHERE status IN ('pending', 'processing') \
             ORDER BY created_at ASC LIMIT ?",
            VERIFICATION_COLUMNS
        );
        self.fetch_all(&query, &[], Some(limit)).await
    }

    async fn mark_refunded(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE verifications SET refunded_at = ?, updated_at = ? \
             WHERE id = ? AND refunded_at IS NULL",
        )
        .bind(at)
        .bind(at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark verification refunded"))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Distinguish "already stamped" from "no such record"
        self.get(id).await?;
        Ok(false)
    }

    async fn record_refund_attempt(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE verifications \
             SET refund_attempts = refund_attempts + 1, last_refund_attempt_at = ? \
             WHERE id = ?",
        )
        .bind(at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to record refund attempt"))?;

        if result.rows_affected() == 0 {
            return Err(VerificationError::NotFound { id }.into());
        }
        Ok(())
    }

    async fn list_unsettled_refunds(&self, limit: usize) -> Result<Vec<Verification>, DomainError> {
        // Never-attempted rows first, then the least recently attempted
        let query = format!(
            "SELECT {} FROM verifications \
             WHERE status IN ('failed', 'cancelled') AND cost > 0 AND refunded_at IS NULL \
             ORDER BY last_refund_attempt_at IS NOT NULL, last_refund_attempt_at ASC, \
             created_at ASC LIMIT ?",
            VERIFICATION_COLUMNS
        );
        self.fetch_all(&query, &[], Some(limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::placeholders;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
