//! In-memory credit ledger used by tests and the in-memory storage backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::value_objects::Money;
use crate::errors::{DomainError, LedgerError};

use super::traits::{CreditLedger, RefundOutcome};

/// Kind of balance mutation recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEntryKind {
    Debit,
    Credit,
    Refund { verification_id: Uuid },
}

/// One applied balance mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub user_id: Uuid,
    pub kind: LedgerEntryKind,
    pub amount: Money,
    pub balance_after: Money,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Uuid, Money>,
    refunded: HashSet<Uuid>,
    journal: Vec<LedgerEntry>,
}

impl LedgerState {
    fn balance(&self, user_id: Uuid) -> Result<Money, DomainError> {
        self.balances
            .get(&user_id)
            .copied()
            .ok_or_else(|| LedgerError::UserNotFound { user_id }.into())
    }

    fn apply(&mut self, user_id: Uuid, kind: LedgerEntryKind, amount: Money, balance_after: Money) {
        self.balances.insert(user_id, balance_after);
        self.journal.push(LedgerEntry {
            user_id,
            kind,
            amount,
            balance_after,
            recorded_at: Utc::now(),
        });
    }
}

/// Credit ledger held in process memory
///
/// One async mutex guards all accounts, which makes every operation an
/// atomic read-modify-write. Applied mutations are journaled so tests can
/// assert on exactly which ledger operations happened.
pub struct InMemoryCreditLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryCreditLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Builder used to seed an account before the ledger is shared
    pub fn with_account(self, user_id: Uuid, balance: Money) -> Self {
        let mut state = self.state.into_inner();
        state.balances.insert(user_id, balance);
        Self {
            state: Mutex::new(state),
        }
    }

    /// Open (or reset) an account with an initial balance
    pub async fn open_account(&self, user_id: Uuid, balance: Money) {
        self.state.lock().await.balances.insert(user_id, balance);
    }

    /// Snapshot of every applied mutation, oldest first
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.state.lock().await.journal.clone()
    }

    /// Number of refunds credited for one verification
    pub async fn refund_count(&self, verification_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .journal
            .iter()
            .filter(|entry| entry.kind == LedgerEntryKind::Refund { verification_id })
            .count()
    }
}

impl Default for InMemoryCreditLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn debit(&self, user_id: Uuid, amount: Money) -> Result<Money, DomainError> {
        let mut state = self.state.lock().await;
        let available = state.balance(user_id)?;

        let balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                required: amount,
                available,
            })?;

        state.apply(user_id, LedgerEntryKind::Debit, amount, balance);
        Ok(balance)
    }

    async fn credit(&self, user_id: Uuid, amount: Money) -> Result<Money, DomainError> {
        let mut state = self.state.lock().await;
        let current = state.balance(user_id)?;

        let balance = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount {
                message: format!("Balance overflow adding {}", amount),
            })?;

        state.apply(user_id, LedgerEntryKind::Credit, amount, balance);
        Ok(balance)
    }

    async fn get_balance(&self, user_id: Uuid) -> Result<Money, DomainError> {
        self.state.lock().await.balance(user_id)
    }

    async fn refund(
        &self,
        user_id: Uuid,
        verification_id: Uuid,
        amount: Money,
    ) -> Result<RefundOutcome, DomainError> {
        let mut state = self.state.lock().await;
        if state.refunded.contains(&verification_id) {
            return Ok(RefundOutcome::AlreadyApplied);
        }

        let current = state.balance(user_id)?;
        let balance = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount {
                message: format!("Balance overflow refunding {}", amount),
            })?;

        state.refunded.insert(verification_id);
        state.apply(
            user_id,
            LedgerEntryKind::Refund { verification_id },
            amount,
            balance,
        );
        Ok(RefundOutcome::Applied { balance })
    }
}
