//! Bounded in-memory audit log

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::audit::AuditLog;
use crate::errors::DomainError;

use super::AuditLogRepository;

/// Default number of retained entries
pub const DEFAULT_CAPACITY: usize = 1000;

/// Thread-safe ring buffer keeping the most recent audit entries
///
/// Once full, each new entry evicts the oldest one.
pub struct RingBufferAuditLog {
    capacity: usize,
    entries: Mutex<VecDeque<AuditLog>>,
}

impl RingBufferAuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn newest_matching<F>(&self, limit: usize, predicate: F) -> Vec<AuditLog>
    where
        F: Fn(&AuditLog) -> bool + Send,
    {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .rev()
            .filter(|log| predicate(log))
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Default for RingBufferAuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl AuditLogRepository for RingBufferAuditLog {
    async fn record(&self, audit_log: &AuditLog) -> Result<(), DomainError> {
        let mut entries = self.entries.lock().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(audit_log.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditLog>, DomainError> {
        Ok(self.newest_matching(limit, |_| true).await)
    }

    async fn find_by_verification(
        &self,
        verification_id: Uuid,
        limit: usize,
    ) -> Result<Vec<AuditLog>, DomainError> {
        Ok(self
            .newest_matching(limit, |log| log.verification_id == Some(verification_id))
            .await)
    }

    async fn find_by_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<AuditLog>, DomainError> {
        Ok(self
            .newest_matching(limit, |log| log.user_id == Some(user_id))
            .await)
    }
}
