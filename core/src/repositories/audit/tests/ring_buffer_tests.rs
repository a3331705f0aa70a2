//! Unit tests for the ring-buffer audit log

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::audit::{AuditEventType, AuditLog};
use crate::repositories::audit::{AuditLogRepository, RingBufferAuditLog};

#[tokio::test]
async fn test_recent_returns_newest_first() {
    let log = RingBufferAuditLog::new(10);

    log.record(&AuditLog::new(AuditEventType::VerificationCreated)).await.unwrap();
    log.record(&AuditLog::new(AuditEventType::VerificationCompleted)).await.unwrap();

    let recent = log.recent(10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].event_type, AuditEventType::VerificationCompleted);
    assert_eq!(recent[1].event_type, AuditEventType::VerificationCreated);
}

#[tokio::test]
async fn test_capacity_evicts_oldest() {
    let log = RingBufferAuditLog::new(3);

    let mut ids = Vec::new();
    for _ in 0..5 {
        let entry = AuditLog::new(AuditEventType::CreditsRefunded);
        ids.push(entry.id);
        log.record(&entry).await.unwrap();
    }

    assert_eq!(log.len().await, 3);
    let retained: Vec<Uuid> = log.recent(10).await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(retained, vec![ids[4], ids[3], ids[2]]);
}

#[tokio::test]
async fn test_zero_capacity_keeps_one_entry() {
    let log = RingBufferAuditLog::new(0);
    log.record(&AuditLog::new(AuditEventType::BulkCancel)).await.unwrap();
    log.record(&AuditLog::new(AuditEventType::BulkCancel)).await.unwrap();
    assert_eq!(log.capacity(), 1);
    assert_eq!(log.len().await, 1);
}

#[tokio::test]
async fn test_filters_by_verification_and_user() {
    let log = RingBufferAuditLog::new(10);
    let user_id = Uuid::new_v4();
    let verification_id = Uuid::new_v4();

    log.record(
        &AuditLog::new(AuditEventType::VerificationCreated)
            .with_user(user_id)
            .with_verification(verification_id),
    )
    .await
    .unwrap();
    log.record(&AuditLog::new(AuditEventType::VerificationCreated).with_user(Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(log.find_by_verification(verification_id, 10).await.unwrap().len(), 1);
    assert_eq!(log.find_by_user(user_id, 10).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers() {
    let log = Arc::new(RingBufferAuditLog::new(50));

    let mut handles = Vec::new();
    for _ in 0..100 {
        let log = Arc::clone(&log);
        handles.push(tokio::spawn(async move {
            log.record(&AuditLog::new(AuditEventType::VerificationProcessing))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(log.len().await, 50);
}
