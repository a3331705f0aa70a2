//! Races between pollers, cancels and purchases

use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::VerificationStatus;
use crate::repositories::VerificationRepository;
use crate::services::lifecycle::{CreateVerificationRequest, ProviderStatus};

use super::mocks::{money, Harness};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_expired_polls_refund_once() {
    let h = Harness::new("10.00");
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();

    h.provider.set_default_status(Ok(ProviderStatus::expired()));
    // Keep both pollers inside the provider call at the same time
    h.provider.set_delay(Duration::from_millis(20));

    let (first, second) = tokio::join!(
        h.service.poll_verification(&h.user, verification.id),
        h.service.poll_verification(&h.user, verification.id),
    );

    assert_eq!(first.unwrap().status, VerificationStatus::Failed);
    assert_eq!(second.unwrap().status, VerificationStatus::Failed);
    assert_eq!(h.provider.status_calls(), 2);
    assert_eq!(h.ledger.refund_count(verification.id).await, 1);
    assert_eq!(h.balance().await, money("10.00"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_spawned_pollers_refund_once() {
    let h = Harness::new("10.00");
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();
    h.provider.set_default_status(Ok(ProviderStatus::expired()));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&h.service);
        let user = h.user;
        let id = verification.id;
        handles.push(tokio::spawn(async move {
            service.poll_verification(&user, id).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(h.ledger.refund_count(verification.id).await, 1);
    assert_eq!(h.balance().await, money("10.00"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_racing_expiry_refunds_once() {
    let h = Harness::new("10.00");
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();
    h.provider.set_default_status(Ok(ProviderStatus::expired()));

    let (_polled, _cancelled) = tokio::join!(
        h.service.poll_verification(&h.user, verification.id),
        h.service.cancel_verification(&h.user, verification.id),
    );

    let stored = h.records.get(verification.id).await.unwrap();
    assert!(matches!(
        stored.status,
        VerificationStatus::Failed | VerificationStatus::Cancelled
    ));
    assert_eq!(h.ledger.refund_count(verification.id).await, 1);
    assert_eq!(h.balance().await, money("10.00"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_never_overdraw() {
    let h = Harness::new("3.00");

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = Arc::clone(&h.service);
        let user = h.user;
        handles.push(tokio::spawn(async move {
            service
                .create_verification(&user, CreateVerificationRequest::new("whatsapp", "US"))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }

    assert_eq!(created, 3);
    assert_eq!(h.balance().await, money("0.00"));
    assert_eq!(h.records.len().await, 3);
}
