//! Mock implementations for testing the lifecycle service

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::value_objects::{Money, SessionContext};
use crate::errors::{DomainError, ProviderError};
use crate::repositories::{
    CreditLedger, InMemoryCreditLedger, InMemoryVerificationRepository, RefundOutcome,
    RingBufferAuditLog,
};
use crate::services::audit::{AuditService, AuditServiceConfig};
use crate::services::lifecycle::{
    LifecycleServiceConfig, NumberAssignment, NumberRequestOptions, PriceList, ProviderStatus,
    SmsProvider, VerificationLifecycleService,
};

pub fn money(value: &str) -> Money {
    Money::parse(value).unwrap()
}

// Scripted provider: numbers are "act-1", "act-2", ... and every status
// query answers from a per-activation script or the shared default.
pub struct ScriptedProvider {
    next_id: AtomicUsize,
    provider_cost: Money,
    request_error: Mutex<Option<ProviderError>>,
    default_status: Mutex<Result<ProviderStatus, ProviderError>>,
    statuses: Mutex<HashMap<String, Result<ProviderStatus, ProviderError>>>,
    delay: Mutex<Option<Duration>>,
    pub request_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(0),
            provider_cost: money("0.50"),
            request_error: Mutex::new(None),
            default_status: Mutex::new(Ok(ProviderStatus::waiting())),
            statuses: Mutex::new(HashMap::new()),
            delay: Mutex::new(None),
            request_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_requests(&self, error: ProviderError) {
        *self.request_error.lock().unwrap() = Some(error);
    }

    pub fn set_default_status(&self, status: Result<ProviderStatus, ProviderError>) {
        *self.default_status.lock().unwrap() = status;
    }

    pub fn set_status(&self, activation_id: &str, status: Result<ProviderStatus, ProviderError>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(activation_id.to_string(), status);
    }

    /// Make every call sleep before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SmsProvider for ScriptedProvider {
    async fn request_number(
        &self,
        _service: &str,
        _country: &str,
        _options: &NumberRequestOptions,
    ) -> Result<NumberAssignment, ProviderError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let error = self.request_error.lock().unwrap().clone();
        if let Some(error) = error {
            return Err(error);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(NumberAssignment {
            activation_id: format!("act-{}", id),
            phone_number: format!("+1415555{:04}", id),
            cost: self.provider_cost,
        })
    }

    async fn get_status(&self, activation_id: &str) -> Result<ProviderStatus, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let scripted = self.statuses.lock().unwrap().get(activation_id).cloned();
        match scripted {
            Some(status) => status,
            None => self.default_status.lock().unwrap().clone(),
        }
    }

    async fn cancel_number(&self, _activation_id: &str) -> Result<(), ProviderError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

// Ledger wrapper counting every call and failing credits or refunds on demand
pub struct CountingLedger {
    inner: Arc<InMemoryCreditLedger>,
    pub calls: AtomicUsize,
    failing_credits: AtomicUsize,
    failing_refunds: AtomicUsize,
}

impl CountingLedger {
    pub fn new(inner: Arc<InMemoryCreditLedger>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            failing_credits: AtomicUsize::new(0),
            failing_refunds: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` credit calls
    pub fn fail_next_credits(&self, count: usize) {
        self.failing_credits.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` refund calls
    pub fn fail_next_refunds(&self, count: usize) {
        self.failing_refunds.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreditLedger for CountingLedger {
    async fn debit(&self, user_id: Uuid, amount: Money) -> Result<Money, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.debit(user_id, amount).await
    }

    async fn credit(&self, user_id: Uuid, amount: Money) -> Result<Money, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_credits.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_credits.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::internal("ledger connection reset"));
        }
        self.inner.credit(user_id, amount).await
    }

    async fn get_balance(&self, user_id: Uuid) -> Result<Money, DomainError> {
        self.inner.get_balance(user_id).await
    }

    async fn refund(
        &self,
        user_id: Uuid,
        verification_id: Uuid,
        amount: Money,
    ) -> Result<RefundOutcome, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_refunds.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_refunds.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::internal("ledger connection reset"));
        }
        self.inner.refund(user_id, verification_id, amount).await
    }
}

/// A lifecycle service wired to in-memory backends and a scripted provider
pub struct Harness {
    pub service: Arc<VerificationLifecycleService>,
    pub ledger: Arc<InMemoryCreditLedger>,
    pub counting: Arc<CountingLedger>,
    pub records: Arc<InMemoryVerificationRepository>,
    pub provider: Arc<ScriptedProvider>,
    pub audit_log: Arc<RingBufferAuditLog>,
    pub user: SessionContext,
    pub admin: SessionContext,
}

impl Harness {
    /// One user holding `balance`, flat price 1.00
    pub fn new(balance: &str) -> Self {
        Self::with_prices(balance, PriceList::flat(money("1.00")))
    }

    pub fn with_prices(balance: &str, pricing: PriceList) -> Self {
        Self::build(balance, pricing, LifecycleServiceConfig::default())
    }

    pub fn build(balance: &str, pricing: PriceList, config: LifecycleServiceConfig) -> Self {
        let user = SessionContext::user(Uuid::new_v4());
        let admin = SessionContext::admin(Uuid::new_v4());

        let ledger = Arc::new(InMemoryCreditLedger::new().with_account(user.user_id, money(balance)));
        let counting = Arc::new(CountingLedger::new(Arc::clone(&ledger)));
        let records = Arc::new(InMemoryVerificationRepository::new());
        let provider = Arc::new(ScriptedProvider::new());
        let audit_log = Arc::new(RingBufferAuditLog::new(100));
        let audit = Arc::new(AuditService::new(
            audit_log.clone(),
            AuditServiceConfig {
                async_writes: false,
            },
        ));

        let service = Arc::new(VerificationLifecycleService::new(
            counting.clone(),
            records.clone(),
            provider.clone(),
            audit,
            pricing,
            config,
        ));

        Self {
            service,
            ledger,
            counting,
            records,
            provider,
            audit_log,
            user,
            admin,
        }
    }

    pub async fn balance(&self) -> Money {
        self.ledger.get_balance(self.user.user_id).await.unwrap()
    }
}
