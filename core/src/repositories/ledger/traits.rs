//! Credit ledger trait defining the interface for balance persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::value_objects::Money;
use crate::errors::DomainError;

/// Result of an idempotent refund
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundOutcome {
    /// The refund was credited; carries the balance afterwards
    Applied { balance: Money },
    /// A refund for this verification had already been credited
    AlreadyApplied,
}

impl RefundOutcome {
    pub fn was_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Holds each user's spendable balance
///
/// Every mutation is an atomic read-modify-write per user and no operation
/// ever leaves a balance below zero.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Reduce the balance by `amount`
    ///
    /// # Returns
    /// * `Ok(Money)` - The new balance
    /// * `Err(DomainError::Ledger(InsufficientFunds))` - `amount` exceeds the balance
    /// * `Err(DomainError::Ledger(UserNotFound))` - No such user
    async fn debit(&self, user_id: Uuid, amount: Money) -> Result<Money, DomainError>;

    /// Increase the balance by `amount`
    ///
    /// # Returns
    /// * `Ok(Money)` - The new balance
    /// * `Err(DomainError::Ledger(UserNotFound))` - The user no longer exists
    async fn credit(&self, user_id: Uuid, amount: Money) -> Result<Money, DomainError>;

    /// Read the current balance
    async fn get_balance(&self, user_id: Uuid) -> Result<Money, DomainError>;

    /// Credit `amount` back for `verification_id`, at most once
    ///
    /// Repeated calls for the same verification return
    /// `RefundOutcome::AlreadyApplied` and leave the balance untouched.
    async fn refund(
        &self,
        user_id: Uuid,
        verification_id: Uuid,
        amount: Money,
    ) -> Result<RefundOutcome, DomainError>;
}
