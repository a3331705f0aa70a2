//! Verification lifecycle service implementation
//!
//! Every transition goes through the record store's conditional write.
//! Only the caller whose write was applied issues the refund, and the
//! ledger refuses a second refund for the same verification, so a cost is
//! refunded at most once even when pollers, cancels and the reconciliation
//! sweep race each other.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use sv_shared::phone::mask_phone_number;
use sv_shared::validation::{
    is_valid_country_code, is_valid_service_name, normalize_country_code, normalize_service_name,
};

use crate::domain::entities::audit::AuditLog;
use crate::domain::entities::{StatusUpdate, Verification, VerificationStatus};
use crate::domain::value_objects::{Money, SessionContext};
use crate::errors::{DomainError, DomainResult, ProviderError, VerificationError};
use crate::repositories::{CreditLedger, RefundOutcome, TransitionOutcome, VerificationRepository};
use crate::services::audit::AuditService;

use super::config::LifecycleServiceConfig;
use super::pricing::PriceList;
use super::traits::SmsProvider;
use super::types::{
    BulkCancelResult, CreateVerificationRequest, NumberRequestOptions, PollBatchResult,
    PollFailure, ProviderState, ProviderStatus, ReconcileResult,
};

/// Record after a poll, plus the provider error that left it unchanged
struct PolledRecord {
    verification: Verification,
    provider_error: Option<ProviderError>,
}

impl PolledRecord {
    fn settled(verification: Verification) -> Self {
        Self {
            verification,
            provider_error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettlementOutcome {
    NothingOwed,
    Refunded,
    AlreadyApplied,
    Failed,
}

struct Settlement {
    verification: Verification,
    outcome: SettlementOutcome,
}

/// Orchestrates creation, polling and termination of verifications
pub struct VerificationLifecycleService {
    ledger: Arc<dyn CreditLedger>,
    records: Arc<dyn VerificationRepository>,
    provider: Arc<dyn SmsProvider>,
    audit: Arc<AuditService>,
    pricing: PriceList,
    config: LifecycleServiceConfig,
}

impl VerificationLifecycleService {
    /// Create a new lifecycle service
    pub fn new(
        ledger: Arc<dyn CreditLedger>,
        records: Arc<dyn VerificationRepository>,
        provider: Arc<dyn SmsProvider>,
        audit: Arc<AuditService>,
        pricing: PriceList,
        config: LifecycleServiceConfig,
    ) -> Self {
        Self {
            ledger,
            records,
            provider,
            audit,
            pricing,
            config,
        }
    }

    pub fn pricing(&self) -> &PriceList {
        &self.pricing
    }

    pub fn config(&self) -> &LifecycleServiceConfig {
        &self.config
    }

    /// Purchase a number for `request.service_name`
    ///
    /// The price is debited before the provider is called. If the provider
    /// call or the record insert fails afterwards, the price is credited
    /// back before the error is returned.
    ///
    /// # Returns
    /// * `Ok(Verification)` - The new record, in `pending`
    /// * `Err(DomainError::Ledger(InsufficientFunds))` - Balance below the price
    /// * `Err(DomainError::Provider(..))` - The provider could not rent a number
    pub async fn create_verification(
        &self,
        ctx: &SessionContext,
        request: CreateVerificationRequest,
    ) -> DomainResult<Verification> {
        let service_name = normalize_service_name(&request.service_name);
        if !is_valid_service_name(&service_name) {
            return Err(DomainError::validation(format!(
                "Invalid service name: {}",
                request.service_name
            )));
        }

        let country = normalize_country_code(&request.country);
        if !is_valid_country_code(&country) {
            return Err(DomainError::validation(format!(
                "Invalid country code: {}",
                request.country
            )));
        }

        let cost = self.pricing.price_for(&service_name);
        let balance = self.ledger.debit(ctx.user_id, cost).await?;

        tracing::info!(
            user_id = %ctx.user_id,
            service = %service_name,
            cost = %cost,
            balance = %balance,
            event = "credits_debited",
            "Debited verification cost"
        );

        let options = NumberRequestOptions {
            area_code: request.area_code,
            carrier: request.carrier,
        };
        let assignment = match self
            .with_deadline(self.provider.request_number(&service_name, &country, &options))
            .await
        {
            Ok(assignment) => assignment,
            Err(e) => {
                tracing::warn!(
                    user_id = %ctx.user_id,
                    service = %service_name,
                    country = %country,
                    provider = self.provider.provider_name(),
                    error = %e,
                    event = "number_request_failed",
                    "Provider could not rent a number"
                );
                self.compensate(ctx.user_id, cost, &e.to_string()).await;
                return Err(e.into());
            }
        };

        if assignment.cost > cost {
            tracing::warn!(
                service = %service_name,
                country = %country,
                charged = %cost,
                provider_cost = %assignment.cost,
                event = "price_below_provider_cost",
                "Provider charged more than the configured price"
            );
        }

        let verification = Verification::new(ctx.user_id, service_name, country, cost)
            .with_assignment(
                assignment.activation_id.clone(),
                assignment.phone_number.clone(),
                Some(assignment.cost),
            );

        if let Err(e) = self.records.create(&verification).await {
            tracing::error!(
                verification_id = %verification.id,
                error = %e,
                event = "verification_store_failed",
                "Failed to store verification record"
            );
            self.release_number(&assignment.activation_id).await;
            self.compensate(ctx.user_id, cost, &e.to_string()).await;
            return Err(e);
        }

        tracing::info!(
            verification_id = %verification.id,
            user_id = %ctx.user_id,
            phone = %mask_phone_number(&assignment.phone_number),
            provider = self.provider.provider_name(),
            event = "verification_created",
            "Verification created"
        );
        self.audit.log_created(&verification, balance).await;

        Ok(verification)
    }

    /// Load one record the caller may see
    pub async fn get_verification(
        &self,
        ctx: &SessionContext,
        id: Uuid,
    ) -> DomainResult<Verification> {
        self.load_owned(ctx, id).await
    }

    /// The caller's records, newest first
    pub async fn list_verifications(
        &self,
        ctx: &SessionContext,
        limit: Option<usize>,
    ) -> DomainResult<Vec<Verification>> {
        self.records
            .list_for_user(ctx.user_id, self.config.clamp_limit(limit))
            .await
    }

    /// The caller's balance
    pub async fn get_balance(&self, ctx: &SessionContext) -> DomainResult<Money> {
        self.ledger.get_balance(ctx.user_id).await
    }

    /// Query the provider for one record and merge the result
    ///
    /// Terminal records are returned as stored without contacting the
    /// provider. Provider errors and timeouts leave the record unchanged.
    pub async fn poll_verification(
        &self,
        ctx: &SessionContext,
        id: Uuid,
    ) -> DomainResult<Verification> {
        let verification = self.load_owned(ctx, id).await?;
        Ok(self.poll_record(verification).await?.verification)
    }

    /// Poll each of the caller's pending and processing records independently
    pub async fn poll_pending_for_user(&self, ctx: &SessionContext) -> DomainResult<PollBatchResult> {
        let pending = self.records.list_pending_for_user(ctx.user_id).await?;
        Ok(self.poll_batch(pending).await)
    }

    /// Poll the oldest active records across all users
    pub async fn poll_active_batch(&self, limit: usize) -> DomainResult<PollBatchResult> {
        let active = self.records.list_active(limit).await?;
        Ok(self.poll_batch(active).await)
    }

    /// Cancel one of the caller's non-terminal records and refund its cost
    ///
    /// # Returns
    /// * `Err(DomainError::Verification(InvalidTransition))` - The record is
    ///   already terminal; nothing is refunded
    pub async fn cancel_verification(
        &self,
        ctx: &SessionContext,
        id: Uuid,
    ) -> DomainResult<Verification> {
        let verification = self.load_owned(ctx, id).await?;
        if verification.is_terminal() {
            return Err(VerificationError::InvalidTransition {
                from: verification.status,
                to: VerificationStatus::Cancelled,
            }
            .into());
        }

        let update = StatusUpdate::to(VerificationStatus::Cancelled).completed_at(Utc::now());
        let (cancelled, applied) = self
            .transition(id, &VerificationStatus::ACTIVE, update, Some(ctx.user_id))
            .await?;
        if !applied {
            return Err(VerificationError::InvalidTransition {
                from: cancelled.status,
                to: VerificationStatus::Cancelled,
            }
            .into());
        }

        tracing::info!(
            verification_id = %id,
            user_id = %cancelled.user_id,
            actor_id = %ctx.user_id,
            event = "verification_cancelled",
            "Verification cancelled"
        );

        if let Some(activation_id) = cancelled.activation_id.clone() {
            self.release_number(&activation_id).await;
        }
        Ok(self.settle_refund(cancelled).await.verification)
    }

    /// Cancel and refund every `pending` record among `ids` (admin only)
    ///
    /// Unknown IDs and records in any other state are skipped silently;
    /// only the aggregate is reported.
    pub async fn bulk_cancel(
        &self,
        ctx: &SessionContext,
        ids: &[Uuid],
    ) -> DomainResult<BulkCancelResult> {
        ctx.require_admin()?;

        let mut seen = HashSet::new();
        let mut cancelled_count = 0;
        let mut total_refunded = Money::zero();

        for &id in ids {
            if !seen.insert(id) {
                continue;
            }

            let verification = match self.records.get(id).await {
                Ok(verification) => verification,
                Err(DomainError::Verification(VerificationError::NotFound { .. })) => continue,
                Err(e) => {
                    tracing::warn!(verification_id = %id, error = %e, "Skipping record in bulk cancel");
                    continue;
                }
            };
            if verification.status != VerificationStatus::Pending {
                continue;
            }

            let update = StatusUpdate::to(VerificationStatus::Cancelled).completed_at(Utc::now());
            let cancelled = match self
                .transition(id, &[VerificationStatus::Pending], update, Some(ctx.user_id))
                .await
            {
                Ok((cancelled, true)) => cancelled,
                Ok((_, false)) => continue,
                Err(e) => {
                    tracing::warn!(verification_id = %id, error = %e, "Skipping record in bulk cancel");
                    continue;
                }
            };

            cancelled_count += 1;
            if let Some(activation_id) = cancelled.activation_id.clone() {
                self.release_number(&activation_id).await;
            }

            let cost = cancelled.cost;
            if self.settle_refund(cancelled).await.outcome == SettlementOutcome::Refunded {
                match total_refunded.checked_add(cost) {
                    Some(total) => total_refunded = total,
                    None => tracing::warn!(
                        verification_id = %id,
                        total_refunded = %total_refunded,
                        amount = %cost,
                        "Refund total overflowed, reported total is short"
                    ),
                }
            }
        }

        tracing::info!(
            actor_id = %ctx.user_id,
            requested = seen.len(),
            cancelled = cancelled_count,
            total_refunded = %total_refunded,
            event = "bulk_cancel",
            "Bulk cancel completed"
        );
        self.audit
            .log_bulk_cancel(ctx.user_id, seen.len(), cancelled_count, total_refunded)
            .await;

        Ok(BulkCancelResult {
            cancelled_count,
            total_refunded,
        })
    }

    /// Re-issue refunds for failed or cancelled records that were never stamped
    ///
    /// Covers refunds that errored and crashes between the status write and
    /// the refund. Safe to run repeatedly: the ledger refund is idempotent.
    pub async fn reconcile_refunds(&self, limit: usize) -> DomainResult<ReconcileResult> {
        let unsettled = self.records.list_unsettled_refunds(limit).await?;
        let mut result = ReconcileResult {
            examined: unsettled.len(),
            ..Default::default()
        };

        for verification in unsettled {
            match self.settle_refund(verification).await.outcome {
                SettlementOutcome::Refunded => result.refunded += 1,
                SettlementOutcome::AlreadyApplied => result.already_applied += 1,
                SettlementOutcome::Failed => result.failed += 1,
                SettlementOutcome::NothingOwed => {}
            }
        }

        if result.examined > 0 {
            tracing::info!(
                examined = result.examined,
                refunded = result.refunded,
                already_applied = result.already_applied,
                failed = result.failed,
                event = "refunds_reconciled",
                "Refund reconciliation completed"
            );
        }
        Ok(result)
    }

    /// Most recent audit entries (admin only)
    pub async fn recent_activity(
        &self,
        ctx: &SessionContext,
        limit: Option<usize>,
    ) -> DomainResult<Vec<AuditLog>> {
        ctx.require_admin()?;
        self.audit.recent(self.config.clamp_limit(limit)).await
    }

    async fn load_owned(&self, ctx: &SessionContext, id: Uuid) -> DomainResult<Verification> {
        let verification = self.records.get(id).await?;
        // Records of other users are indistinguishable from missing ones
        if !ctx.can_act_for(verification.user_id) {
            return Err(VerificationError::NotFound { id }.into());
        }
        Ok(verification)
    }

    async fn poll_batch(&self, records: Vec<Verification>) -> PollBatchResult {
        let mut batch = PollBatchResult::default();

        for verification in records {
            let verification_id = verification.id;
            match self.poll_record(verification).await {
                Ok(polled) => {
                    if let Some(e) = polled.provider_error {
                        batch.errors.push(PollFailure {
                            verification_id,
                            error: e.to_string(),
                        });
                    }
                    batch.results.push(polled.verification);
                }
                Err(e) => {
                    tracing::warn!(
                        verification_id = %verification_id,
                        error = %e,
                        event = "poll_failed",
                        "Failed to poll verification"
                    );
                    batch.errors.push(PollFailure {
                        verification_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        batch
    }

    async fn poll_record(&self, verification: Verification) -> DomainResult<PolledRecord> {
        if verification.is_terminal() {
            return Ok(PolledRecord::settled(verification));
        }
        let Some(activation_id) = verification.activation_id.clone() else {
            return Ok(PolledRecord::settled(verification));
        };

        let status = match self
            .with_deadline(self.provider.get_status(&activation_id))
            .await
        {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(
                    verification_id = %verification.id,
                    provider = self.provider.provider_name(),
                    error = %e,
                    event = "provider_poll_failed",
                    "Provider status query failed, keeping record unchanged"
                );
                return Ok(PolledRecord {
                    verification,
                    provider_error: Some(e),
                });
            }
        };

        let now = Utc::now();
        let ProviderStatus {
            state,
            sms_code,
            sms_text,
        } = status;

        let verification = match (state, sms_code) {
            (ProviderState::Received, Some(code)) => {
                let update = StatusUpdate::to(VerificationStatus::Completed)
                    .with_code(code, sms_text)
                    .completed_at(now);
                let (completed, applied) = self
                    .transition(verification.id, &VerificationStatus::ACTIVE, update, None)
                    .await?;
                if applied {
                    tracing::info!(
                        verification_id = %completed.id,
                        event = "sms_received",
                        "Verification completed"
                    );
                }
                completed
            }
            (ProviderState::Expired, _) => self.fail(verification, "expired", now).await?,
            (ProviderState::Cancelled, _) => {
                self.fail(verification, "cancelled by provider", now).await?
            }
            // Waiting, or a "received" report that carries no code yet
            (ProviderState::Waiting, _) | (ProviderState::Received, None) => {
                self.keep_waiting(verification, now).await?
            }
        };

        Ok(PolledRecord::settled(verification))
    }

    /// The provider has nothing yet: expire locally or promote to processing
    async fn keep_waiting(
        &self,
        verification: Verification,
        now: DateTime<Utc>,
    ) -> DomainResult<Verification> {
        if verification.is_expired(now, self.config.max_lifetime) {
            let failed = self.fail(verification, "max lifetime exceeded", now).await?;
            if failed.status == VerificationStatus::Failed {
                if let Some(activation_id) = failed.activation_id.clone() {
                    self.release_number(&activation_id).await;
                }
            }
            return Ok(failed);
        }

        if verification.status == VerificationStatus::Pending {
            let (processing, _) = self
                .transition(
                    verification.id,
                    &[VerificationStatus::Pending],
                    StatusUpdate::to(VerificationStatus::Processing),
                    None,
                )
                .await?;
            return Ok(processing);
        }

        Ok(verification)
    }

    async fn fail(
        &self,
        verification: Verification,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Verification> {
        let update = StatusUpdate::to(VerificationStatus::Failed).completed_at(now);
        let (failed, applied) = self
            .transition(verification.id, &VerificationStatus::ACTIVE, update, None)
            .await?;
        if !applied {
            return Ok(failed);
        }

        tracing::info!(
            verification_id = %failed.id,
            reason = reason,
            event = "verification_failed",
            "Verification failed"
        );
        Ok(self.settle_refund(failed).await.verification)
    }

    /// Conditional write; returns the record and whether this call won
    async fn transition(
        &self,
        id: Uuid,
        expected: &[VerificationStatus],
        update: StatusUpdate,
        actor: Option<Uuid>,
    ) -> DomainResult<(Verification, bool)> {
        match self.records.update_status(id, expected, update).await? {
            TransitionOutcome::Applied(updated) => {
                tracing::debug!(
                    verification_id = %id,
                    status = %updated.status,
                    "Status transition applied"
                );
                self.audit.log_transition(&updated, actor).await;
                Ok((updated, true))
            }
            TransitionOutcome::Conflict(current) => {
                tracing::debug!(
                    verification_id = %id,
                    status = %current.status,
                    event = "transition_conflict",
                    "Record changed by another writer"
                );
                Ok((current, false))
            }
        }
    }

    /// Refund a failed or cancelled record's cost and stamp `refunded_at`
    ///
    /// A ledger error is logged and audited; the record stays unstamped and
    /// is picked up by `reconcile_refunds`.
    async fn settle_refund(&self, mut verification: Verification) -> Settlement {
        if !verification.needs_refund() {
            return Settlement {
                verification,
                outcome: SettlementOutcome::NothingOwed,
            };
        }

        let outcome = match self
            .ledger
            .refund(verification.user_id, verification.id, verification.cost)
            .await
        {
            Ok(RefundOutcome::Applied { balance }) => {
                tracing::info!(
                    verification_id = %verification.id,
                    user_id = %verification.user_id,
                    amount = %verification.cost,
                    balance = %balance,
                    event = "credits_refunded",
                    "Refunded verification cost"
                );
                self.audit.log_refunded(&verification, balance).await;
                SettlementOutcome::Refunded
            }
            Ok(RefundOutcome::AlreadyApplied) => {
                tracing::debug!(
                    verification_id = %verification.id,
                    "Refund already applied"
                );
                SettlementOutcome::AlreadyApplied
            }
            Err(e) => {
                tracing::error!(
                    verification_id = %verification.id,
                    user_id = %verification.user_id,
                    amount = %verification.cost,
                    attempts = verification.refund_attempts + 1,
                    error = %e,
                    event = "refund_failed",
                    "Refund failed, left for reconciliation"
                );
                self.audit.log_refund_failed(&verification, &e.to_string()).await;

                let now = Utc::now();
                match self.records.record_refund_attempt(verification.id, now).await {
                    Ok(()) => {
                        verification.refund_attempts = verification.refund_attempts.saturating_add(1);
                        verification.last_refund_attempt_at = Some(now);
                    }
                    Err(e) => tracing::warn!(
                        verification_id = %verification.id,
                        error = %e,
                        "Failed to record refund attempt"
                    ),
                }
                return Settlement {
                    verification,
                    outcome: SettlementOutcome::Failed,
                };
            }
        };

        let now = Utc::now();
        match self.records.mark_refunded(verification.id, now).await {
            Ok(_) => verification.refunded_at = verification.refunded_at.or(Some(now)),
            Err(e) => tracing::warn!(
                verification_id = %verification.id,
                error = %e,
                "Failed to stamp refund, next reconciliation will retry"
            ),
        }

        Settlement {
            verification,
            outcome,
        }
    }

    /// Credit back a debit whose verification could not be created
    ///
    /// A failed credit is logged and audited with `restored = false`; the
    /// caller still gets the original error.
    async fn compensate(&self, user_id: Uuid, amount: Money, reason: &str) {
        let restored = match self.ledger.credit(user_id, amount).await {
            Ok(balance) => {
                tracing::info!(
                    user_id = %user_id,
                    amount = %amount,
                    balance = %balance,
                    event = "creation_compensated",
                    "Credited back cost of failed creation"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    amount = %amount,
                    reason = reason,
                    error = %e,
                    event = "compensation_failed",
                    "Failed to credit back cost of failed creation"
                );
                false
            }
        };
        self.audit.log_compensated(user_id, amount, reason, restored).await;
    }

    /// Return the number to the provider; failures are only logged
    async fn release_number(&self, activation_id: &str) {
        if let Err(e) = self
            .with_deadline(self.provider.cancel_number(activation_id))
            .await
        {
            tracing::warn!(
                activation_id = activation_id,
                provider = self.provider.provider_name(),
                error = %e,
                "Failed to release number at provider"
            );
        }
    }

    /// Bound a provider call by the configured deadline
    async fn with_deadline<T, F>(&self, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.config.provider_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        }
    }
}
