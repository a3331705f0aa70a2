//! Audit log repository trait defining the interface for audit log persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::audit::AuditLog;
use crate::errors::DomainError;

/// Repository trait for AuditLog persistence operations
///
/// Implementations should keep writes cheap; lifecycle operations record
/// several entries each.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append an audit log entry
    async fn record(&self, audit_log: &AuditLog) -> Result<(), DomainError>;

    /// Most recent entries, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<AuditLog>, DomainError>;

    /// Entries for one verification, newest first
    async fn find_by_verification(
        &self,
        verification_id: Uuid,
        limit: usize,
    ) -> Result<Vec<AuditLog>, DomainError>;

    /// Entries for one user, newest first
    async fn find_by_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<AuditLog>, DomainError>;
}
