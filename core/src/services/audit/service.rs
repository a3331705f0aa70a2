//! Audit service for recording verification lifecycle and billing events.
//!
//! Writes never fail the calling operation: errors are logged and dropped.
//! With `async_writes` enabled, entries are written from a spawned task so
//! the lifecycle path does not wait on the audit store.

use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::domain::entities::audit::{AuditEventType, AuditLog};
use crate::domain::entities::{Verification, VerificationStatus};
use crate::domain::value_objects::Money;
use crate::errors::DomainResult;
use crate::repositories::AuditLogRepository;

/// Configuration for the audit service
#[derive(Debug, Clone)]
pub struct AuditServiceConfig {
    /// Whether to run audit writes asynchronously
    pub async_writes: bool,
}

impl Default for AuditServiceConfig {
    fn default() -> Self {
        Self { async_writes: true }
    }
}

/// Service recording lifecycle events into an injected repository
pub struct AuditService {
    repository: Arc<dyn AuditLogRepository>,
    config: AuditServiceConfig,
}

impl AuditService {
    /// Create a new audit service
    pub fn new(repository: Arc<dyn AuditLogRepository>, config: AuditServiceConfig) -> Self {
        Self { repository, config }
    }

    /// Base entry describing one verification
    fn verification_entry(event_type: AuditEventType, verification: &Verification) -> AuditLog {
        AuditLog::new(event_type)
            .with_user(verification.user_id)
            .with_verification(verification.id)
            .with_detail("status", verification.status.as_str())
            .with_detail("service", verification.service_name.clone())
    }

    /// A verification was created and its cost debited
    pub async fn log_created(&self, verification: &Verification, balance: Money) {
        let entry = Self::verification_entry(AuditEventType::VerificationCreated, verification)
            .with_amount(verification.cost)
            .with_detail("country", verification.country.clone())
            .with_detail("balance", balance.to_string());
        self.write_log(entry).await;
    }

    /// A creation failed after the debit and the amount was credited back
    pub async fn log_compensated(&self, user_id: Uuid, amount: Money, reason: &str, restored: bool) {
        let entry = AuditLog::new(AuditEventType::CreationCompensated)
            .with_user(user_id)
            .with_amount(amount)
            .with_detail("reason", reason)
            .with_detail("restored", restored);
        self.write_log(entry).await;
    }

    /// A status transition won its conditional write
    ///
    /// `actor` is the caller who triggered it; it is only recorded when it
    /// differs from the owner.
    pub async fn log_transition(&self, verification: &Verification, actor: Option<Uuid>) {
        let event_type = match verification.status {
            VerificationStatus::Pending => return,
            VerificationStatus::Processing => AuditEventType::VerificationProcessing,
            VerificationStatus::Completed => AuditEventType::VerificationCompleted,
            VerificationStatus::Failed => AuditEventType::VerificationFailed,
            VerificationStatus::Cancelled => AuditEventType::VerificationCancelled,
        };

        let mut entry = Self::verification_entry(event_type, verification);
        if let Some(actor_id) = actor {
            entry = entry.with_actor(actor_id);
        }
        self.write_log(entry).await;
    }

    /// The cost of a verification was credited back
    pub async fn log_refunded(&self, verification: &Verification, balance: Money) {
        let entry = Self::verification_entry(AuditEventType::CreditsRefunded, verification)
            .with_amount(verification.cost)
            .with_detail("balance", balance.to_string());
        self.write_log(entry).await;
    }

    /// Refunding failed; the reconciliation sweep will retry
    pub async fn log_refund_failed(&self, verification: &Verification, error: &str) {
        let entry = Self::verification_entry(AuditEventType::RefundFailed, verification)
            .with_amount(verification.cost)
            .with_detail("error", error);
        self.write_log(entry).await;
    }

    /// Summary of an admin bulk cancel
    pub async fn log_bulk_cancel(
        &self,
        actor_id: Uuid,
        requested: usize,
        cancelled: usize,
        total_refunded: Money,
    ) {
        let entry = AuditLog::new(AuditEventType::BulkCancel)
            .with_actor(actor_id)
            .with_amount(total_refunded)
            .with_detail("requested", requested)
            .with_detail("cancelled", cancelled);
        self.write_log(entry).await;
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: usize) -> DomainResult<Vec<AuditLog>> {
        self.repository.recent(limit).await
    }

    /// Entries for one verification, newest first
    pub async fn for_verification(
        &self,
        verification_id: Uuid,
        limit: usize,
    ) -> DomainResult<Vec<AuditLog>> {
        self.repository.find_by_verification(verification_id, limit).await
    }

    /// Internal method to write audit logs
    ///
    /// If async_writes is enabled, the write happens in a background task.
    async fn write_log(&self, audit_log: AuditLog) {
        if self.config.async_writes {
            let repository = Arc::clone(&self.repository);

            task::spawn(async move {
                if let Err(e) = repository.record(&audit_log).await {
                    tracing::error!(
                        error = %e,
                        event_type = audit_log.event_type.as_str(),
                        "Failed to write audit log"
                    );
                }
            });
        } else if let Err(e) = self.repository.record(&audit_log).await {
            tracing::error!(
                error = %e,
                event_type = audit_log.event_type.as_str(),
                "Failed to write audit log"
            );
        }
    }
}
