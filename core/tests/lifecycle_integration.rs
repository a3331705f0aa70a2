//! Integration tests for the verification lifecycle through the public API

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use sv_core::{
        AuditEventType, AuditService, AuditServiceConfig, CreateVerificationRequest,
        CreditLedger, DomainError, InMemoryCreditLedger, InMemoryVerificationRepository,
        LedgerError, LifecycleServiceConfig, Money, NumberAssignment, NumberRequestOptions,
        PriceList, ProviderError, ProviderStatus, RingBufferAuditLog, SessionContext,
        SmsProvider, VerificationLifecycleService, VerificationStatus,
    };

    // Provider whose numbers receive a code once `deliver` is called
    struct InboxProvider {
        delivered: Mutex<HashMap<String, String>>,
        counter: Mutex<u32>,
    }

    impl InboxProvider {
        fn new() -> Self {
            Self {
                delivered: Mutex::new(HashMap::new()),
                counter: Mutex::new(0),
            }
        }

        async fn deliver(&self, activation_id: &str, code: &str) {
            self.delivered
                .lock()
                .await
                .insert(activation_id.to_string(), code.to_string());
        }
    }

    #[async_trait]
    impl SmsProvider for InboxProvider {
        async fn request_number(
            &self,
            _service: &str,
            _country: &str,
            _options: &NumberRequestOptions,
        ) -> Result<NumberAssignment, ProviderError> {
            let mut counter = self.counter.lock().await;
            *counter += 1;
            Ok(NumberAssignment {
                activation_id: format!("inbox-{}", counter),
                phone_number: format!("+1555000{:04}", counter),
                cost: Money::parse("0.40").unwrap(),
            })
        }

        async fn get_status(&self, activation_id: &str) -> Result<ProviderStatus, ProviderError> {
            match self.delivered.lock().await.get(activation_id) {
                Some(code) => Ok(ProviderStatus::received(code.clone(), None)),
                None => Ok(ProviderStatus::waiting()),
            }
        }

        async fn cancel_number(&self, _activation_id: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        fn provider_name(&self) -> &str {
            "inbox"
        }
    }

    struct Setup {
        service: VerificationLifecycleService,
        provider: Arc<InboxProvider>,
        audit_log: Arc<RingBufferAuditLog>,
        user: SessionContext,
        admin: SessionContext,
    }

    fn setup(balance: &str) -> Setup {
        let user = SessionContext::user(Uuid::new_v4());
        let admin = SessionContext::admin(Uuid::new_v4());
        let ledger = Arc::new(
            InMemoryCreditLedger::new().with_account(user.user_id, Money::parse(balance).unwrap()),
        );
        let provider = Arc::new(InboxProvider::new());
        let audit_log = Arc::new(RingBufferAuditLog::new(50));
        let audit = Arc::new(AuditService::new(
            audit_log.clone(),
            AuditServiceConfig {
                async_writes: false,
            },
        ));

        let service = VerificationLifecycleService::new(
            ledger as Arc<dyn CreditLedger>,
            Arc::new(InMemoryVerificationRepository::new()),
            provider.clone(),
            audit,
            PriceList::flat(Money::parse("1.00").unwrap())
                .with_price("whatsapp", Money::parse("1.50").unwrap()),
            LifecycleServiceConfig::default(),
        );

        Setup {
            service,
            provider,
            audit_log,
            user,
            admin,
        }
    }

    #[tokio::test]
    async fn test_full_purchase_to_code_flow() {
        let s = setup("3.00");

        let created = s
            .service
            .create_verification(&s.user, CreateVerificationRequest::new("WhatsApp", "us"))
            .await
            .unwrap();
        assert_eq!(created.status, VerificationStatus::Pending);
        assert_eq!(created.service_name, "whatsapp");
        assert_eq!(s.service.get_balance(&s.user).await.unwrap(), Money::parse("1.50").unwrap());

        let waiting = s.service.poll_verification(&s.user, created.id).await.unwrap();
        assert_eq!(waiting.status, VerificationStatus::Processing);

        s.provider
            .deliver(created.activation_id.as_deref().unwrap(), "771204")
            .await;
        let done = s.service.poll_verification(&s.user, created.id).await.unwrap();
        assert_eq!(done.status, VerificationStatus::Completed);
        assert_eq!(done.sms_code.as_deref(), Some("771204"));
        assert!(done.completed_at.is_some());

        // Terminal records stay put and keep the charge
        let again = s.service.poll_verification(&s.user, created.id).await.unwrap();
        assert_eq!(again, done);
        assert_eq!(s.service.get_balance(&s.user).await.unwrap(), Money::parse("1.50").unwrap());
    }

    #[tokio::test]
    async fn test_second_purchase_rejected_without_funds() {
        let s = setup("2.00");
        s.service
            .create_verification(&s.user, CreateVerificationRequest::new("whatsapp", "US"))
            .await
            .unwrap();

        let err = s
            .service
            .create_verification(&s.user, CreateVerificationRequest::new("whatsapp", "US"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Ledger(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(s.service.list_verifications(&s.user, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_refunds_and_audits() {
        let s = setup("5.00");
        let created = s
            .service
            .create_verification(&s.user, CreateVerificationRequest::new("telegram", "GB"))
            .await
            .unwrap();

        let cancelled = s
            .service
            .cancel_verification(&s.user, created.id)
            .await
            .unwrap();

        assert_eq!(cancelled.status, VerificationStatus::Cancelled);
        assert!(cancelled.refunded_at.is_some());
        assert_eq!(s.service.get_balance(&s.user).await.unwrap(), Money::parse("5.00").unwrap());

        let activity = s.service.recent_activity(&s.admin, None).await.unwrap();
        let events: Vec<AuditEventType> = activity.iter().map(|log| log.event_type).collect();
        assert!(events.contains(&AuditEventType::VerificationCreated));
        assert!(events.contains(&AuditEventType::VerificationCancelled));
        assert!(events.contains(&AuditEventType::CreditsRefunded));
        assert!(!s.audit_log.is_empty().await);
    }

    #[tokio::test]
    async fn test_user_cannot_read_activity() {
        let s = setup("5.00");
        let err = s.service.recent_activity(&s.user, None).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));
    }
}
