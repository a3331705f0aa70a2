//! End-to-end lifecycle scenarios against in-memory backends

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::{Verification, VerificationStatus};
use crate::domain::value_objects::Money;
use crate::errors::{DomainError, VerificationError};
use crate::repositories::VerificationRepository;
use crate::services::lifecycle::{CreateVerificationRequest, PriceList, ProviderStatus};

use super::mocks::{money, Harness};

#[tokio::test]
async fn test_purchase_debits_price() {
    let prices = PriceList::flat(money("1.00")).with_price("whatsapp", money("1.10"));
    let h = Harness::with_prices("10.00", prices);

    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();

    assert_eq!(h.balance().await, money("8.90"));
    assert_eq!(verification.status, VerificationStatus::Pending);
    assert_eq!(verification.cost, money("1.10"));
}

#[tokio::test]
async fn test_received_code_completes_without_refund() {
    let prices = PriceList::flat(money("1.00")).with_price("whatsapp", money("1.10"));
    let h = Harness::with_prices("10.00", prices);
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();

    h.provider.set_status(
        verification.activation_id.as_deref().unwrap(),
        Ok(ProviderStatus::received("482913", None)),
    );
    let polled = h
        .service
        .poll_verification(&h.user, verification.id)
        .await
        .unwrap();

    assert_eq!(polled.status, VerificationStatus::Completed);
    assert_eq!(polled.sms_code.as_deref(), Some("482913"));
    assert_eq!(h.balance().await, money("8.90"));
}

#[tokio::test]
async fn test_expired_number_fails_and_refunds() {
    let prices = PriceList::flat(money("1.00")).with_price("telegram", money("0.90"));
    let h = Harness::with_prices("10.00", prices);
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("telegram", "GB"))
        .await
        .unwrap();
    assert_eq!(h.balance().await, money("9.10"));

    h.provider.set_default_status(Ok(ProviderStatus::expired()));
    let polled = h
        .service
        .poll_verification(&h.user, verification.id)
        .await
        .unwrap();

    assert_eq!(polled.status, VerificationStatus::Failed);
    assert!(polled.completed_at.is_some());
    assert_eq!(h.balance().await, money("10.00"));
    assert_eq!(h.ledger.refund_count(verification.id).await, 1);
}

#[tokio::test]
async fn test_bulk_cancel_refunds_only_pending() {
    let prices = PriceList::flat(money("1.00"))
        .with_price("alpha", money("1.00"))
        .with_price("charlie", money("2.00"));
    let h = Harness::with_prices("10.00", prices);

    let a = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("alpha", "US"))
        .await
        .unwrap();
    let b = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("bravo", "US"))
        .await
        .unwrap();
    let c = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("charlie", "US"))
        .await
        .unwrap();
    assert_eq!(h.balance().await, money("6.00"));

    h.provider.set_status(
        b.activation_id.as_deref().unwrap(),
        Ok(ProviderStatus::received("111222", None)),
    );
    h.service.poll_verification(&h.user, b.id).await.unwrap();

    let result = h
        .service
        .bulk_cancel(&h.admin, &[a.id, b.id, c.id, Uuid::new_v4()])
        .await
        .unwrap();

    assert_eq!(result.cancelled_count, 2);
    assert_eq!(result.total_refunded, money("3.00"));
    assert_eq!(h.balance().await, money("9.00"));

    let mut statuses = Vec::new();
    for id in [a.id, b.id, c.id] {
        statuses.push(h.records.get(id).await.unwrap().status);
    }
    assert_eq!(
        statuses,
        vec![
            VerificationStatus::Cancelled,
            VerificationStatus::Completed,
            VerificationStatus::Cancelled,
        ]
    );
    assert_eq!(h.ledger.refund_count(b.id).await, 0);
}

#[tokio::test]
async fn test_bulk_cancel_skips_processing_and_duplicates() {
    let h = Harness::new("10.00");
    let processing = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();
    h.service
        .poll_verification(&h.user, processing.id)
        .await
        .unwrap();
    let pending = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();

    let result = h
        .service
        .bulk_cancel(&h.admin, &[processing.id, pending.id, pending.id])
        .await
        .unwrap();

    assert_eq!(result.cancelled_count, 1);
    assert_eq!(result.total_refunded, money("1.00"));
    assert_eq!(
        h.records.get(processing.id).await.unwrap().status,
        VerificationStatus::Processing
    );
    assert_eq!(h.ledger.refund_count(pending.id).await, 1);
}

#[tokio::test]
async fn test_bulk_cancel_total_stops_at_overflow() {
    let h = Harness::new("10.00");
    let huge = Money::new(Decimal::MAX).unwrap();

    let mut ids = Vec::new();
    for _ in 0..2 {
        let owner = Uuid::new_v4();
        h.ledger.open_account(owner, Money::zero()).await;
        let verification = Verification::new(owner, "whatsapp", "US", huge);
        h.records.insert_raw(verification.clone()).await;
        ids.push(verification.id);
    }

    let result = h.service.bulk_cancel(&h.admin, &ids).await.unwrap();

    // Both refunds land; the reported total keeps the last representable sum
    assert_eq!(result.cancelled_count, 2);
    assert_eq!(result.total_refunded, huge);
    for id in &ids {
        assert_eq!(h.ledger.refund_count(*id).await, 1);
    }
}

#[tokio::test]
async fn test_bulk_cancel_requires_admin() {
    let h = Harness::new("10.00");
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();

    let result = h.service.bulk_cancel(&h.user, &[verification.id]).await;

    assert!(matches!(result, Err(DomainError::Forbidden { .. })));
    assert_eq!(
        h.records.get(verification.id).await.unwrap().status,
        VerificationStatus::Pending
    );
}

#[tokio::test]
async fn test_cancelling_twice_is_rejected_without_second_refund() {
    let h = Harness::new("10.00");
    let verification = h
        .service
        .create_verification(&h.user, CreateVerificationRequest::new("whatsapp", "US"))
        .await
        .unwrap();

    h.service
        .cancel_verification(&h.user, verification.id)
        .await
        .unwrap();
    let second = h.service.cancel_verification(&h.user, verification.id).await;

    assert!(matches!(
        second,
        Err(DomainError::Verification(VerificationError::InvalidTransition {
            from: VerificationStatus::Cancelled,
            to: VerificationStatus::Cancelled,
        }))
    ));
    assert_eq!(h.balance().await, money("10.00"));
    assert_eq!(h.ledger.refund_count(verification.id).await, 1);
}
