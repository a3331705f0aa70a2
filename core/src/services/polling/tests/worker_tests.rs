//! Tests for the polling worker

use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::VerificationStatus;
use crate::repositories::VerificationRepository;
use crate::services::lifecycle::tests::mocks::{money, Harness};
use crate::services::lifecycle::{CreateVerificationRequest, ProviderStatus};
use crate::services::polling::{PollingWorker, PollingWorkerConfig};

fn worker(h: &Harness, config: PollingWorkerConfig) -> Arc<PollingWorker> {
    Arc::new(PollingWorker::new(Arc::clone(&h.service), config))
}

#[tokio::test]
async fn test_cycle_with_nothing_active() {
    let h = Harness::new("5.00");
    let result = worker(&h, PollingWorkerConfig::default())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(result.polled, 0);
    assert_eq!(result.refunds_settled, 0);
    assert!(result.is_success());
}

#[tokio::test]
async fn test_cycle_polls_active_records() {
    let h = Harness::new("5.00");
    let first = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("telegram", "US"))
        .await
        .unwrap();
    let second = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();
    h.provider.set_status(
        first.activation_id.as_deref().unwrap(),
        Ok(ProviderStatus::received("123456", None)),
    );

    let result = worker(&h, PollingWorkerConfig::default())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(result.polled, 2);
    assert_eq!(result.finished, 1);
    assert_eq!(
        h.records.get(first.id).await.unwrap().status,
        VerificationStatus::Completed
    );
    assert_eq!(
        h.records.get(second.id).await.unwrap().status,
        VerificationStatus::Processing
    );
}

#[tokio::test]
async fn test_cycle_respects_batch_size() {
    let h = Harness::new("5.00");
    for service in ["telegram", "whatsapp", "signal"] {
        h.service
            .create_verification(&h.user, CreateVerificationRequest::new(service, "US"))
            .await
            .unwrap();
    }

    let config = PollingWorkerConfig {
        batch_size: 2,
        ..Default::default()
    };
    let result = worker(&h, config).run_cycle().await.unwrap();

    assert_eq!(result.polled, 2);
    assert_eq!(h.provider.status_calls(), 2);
}

#[tokio::test]
async fn test_cycle_settles_refund_that_failed_during_poll() {
    let h = Harness::new("5.00");
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("telegram", "US"))
        .await
        .unwrap();
    h.provider.set_default_status(Ok(ProviderStatus::expired()));
    h.counting.fail_next_refunds(1);

    let result = worker(&h, PollingWorkerConfig::default())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(result.finished, 1);
    assert_eq!(result.refunds_settled, 1);
    assert_eq!(result.refunds_pending, 0);
    assert_eq!(h.balance().await, money("5.00"));
    assert_eq!(h.ledger.refund_count(verification.id).await, 1);
    assert!(h.records.get(verification.id).await.unwrap().refunded_at.is_some());
}

#[tokio::test]
async fn test_provider_errors_are_counted_not_fatal() {
    let h = Harness::new("5.00");
    h.service
        .create_verification(&h.user, CreateVerificationRequest::new("telegram", "US"))
        .await
        .unwrap();
    h.provider
        .set_default_status(Err(crate::errors::ProviderError::Unavailable {
            message: "maintenance".to_string(),
        }));

    let result = worker(&h, PollingWorkerConfig::default())
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(result.poll_errors, 1);
    assert!(result.is_success());
}

#[tokio::test]
async fn test_disabled_worker_does_nothing() {
    let h = Harness::new("5.00");
    h.service
        .create_verification(&h.user, CreateVerificationRequest::new("telegram", "US"))
        .await
        .unwrap();

    let config = PollingWorkerConfig {
        enabled: false,
        ..Default::default()
    };
    let worker = worker(&h, config);

    let result = worker.run_cycle().await.unwrap();
    assert_eq!(result.polled, 0);
    assert_eq!(h.provider.status_calls(), 0);
    assert!(worker.start_background_task().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_background_task_runs_on_interval() {
    let h = Harness::new("5.00");
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("telegram", "US"))
        .await
        .unwrap();
    h.provider.set_default_status(Ok(ProviderStatus::expired()));

    let config = PollingWorkerConfig {
        interval_seconds: 5,
        ..Default::default()
    };
    let handle = worker(&h, config).start_background_task().unwrap();

    tokio::time::sleep(Duration::from_secs(6)).await;
    handle.abort();

    assert_eq!(
        h.records.get(verification.id).await.unwrap().status,
        VerificationStatus::Failed
    );
    assert_eq!(h.balance().await, money("5.00"));
}
