//! MySQL implementation of the CreditLedger trait.
//!
//! Balances live in `users.credits`. Each mutation locks the user's row for
//! the length of a short transaction; refunds additionally insert into
//! `credit_refunds`, whose primary key makes them idempotent.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use uuid::Uuid;

use sv_core::domain::value_objects::Money;
use sv_core::errors::{DomainError, LedgerError};
use sv_core::repositories::{CreditLedger, RefundOutcome};

use super::rows::{db_error, to_money};

/// MySQL implementation of CreditLedger
pub struct MySqlCreditLedger {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlCreditLedger {
    /// Create a new MySQL credit ledger
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Lock the user's row and read the balance
    async fn lock_balance(
        tx: &mut Transaction<'_, MySql>,
        user_id: Uuid,
    ) -> Result<Money, DomainError> {
        let row = sqlx::query("SELECT credits FROM users WHERE id = ? FOR UPDATE")
            .bind(user_id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("Failed to read balance"))?;

        let row = row.ok_or(LedgerError::UserNotFound { user_id })?;
        let credits: Decimal = row.try_get("credits").map_err(db_error("Failed to get credits"))?;
        to_money(credits)
    }

    async fn write_balance(
        tx: &mut Transaction<'_, MySql>,
        user_id: Uuid,
        balance: Money,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE users SET credits = ? WHERE id = ?")
            .bind(balance.amount())
            .bind(user_id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to write balance"))?;
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'_, MySql>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(db_error("Failed to begin ledger transaction"))
    }
}

#[async_trait]
impl CreditLedger for MySqlCreditLedger {
    async fn debit(&self, user_id: Uuid, amount: Money) -> Result<Money, DomainError> {
        let mut tx = self.begin().await?;
        let available = Self::lock_balance(&mut tx, user_id).await?;

        // Dropping the transaction rolls it back and releases the lock
        let balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                required: amount,
                available,
            })?;

        Self::write_balance(&mut tx, user_id, balance).await?;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit debit"))?;

        tracing::debug!(user_id = %user_id, amount = %amount, balance = %balance, "Debited credits");
        Ok(balance)
    }

    async fn credit(&self, user_id: Uuid, amount: Money) -> Result<Money, DomainError> {
        let mut tx = self.begin().await?;
        let current = Self::lock_balance(&mut tx, user_id).await?;

        let balance = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount {
                message: format!("Balance overflow adding {}", amount),
            })?;

        Self::write_balance(&mut tx, user_id, balance).await?;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit credit"))?;

        tracing::debug!(user_id = %user_id, amount = %amount, balance = %balance, "Credited credits");
        Ok(balance)
    }

    async fn get_balance(&self, user_id: Uuid) -> Result<Money, DomainError> {
        let row = sqlx::query("SELECT credits FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to read balance"))?;

        let row = row.ok_or(LedgerError::UserNotFound { user_id })?;
        let credits: Decimal = row.try_get("credits").map_err(db_error("Failed to get credits"))?;
        to_money(credits)
    }

    async fn refund(
        &self,
        user_id: Uuid,
        verification_id: Uuid,
        amount: Money,
    ) -> Result<RefundOutcome, DomainError> {
        let mut tx = self.begin().await?;
        let current = Self::lock_balance(&mut tx, user_id).await?;

        let inserted = sqlx::query(
            "INSERT INTO credit_refunds (verification_id, user_id, amount) VALUES (?, ?, ?)",
        )
        .bind(verification_id.to_string())
        .bind(user_id.to_string())
        .bind(amount.amount())
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::debug!(verification_id = %verification_id, "Refund already applied");
                return Ok(RefundOutcome::AlreadyApplied);
            }
            Err(e) => return Err(db_error("Failed to record refund")(e)),
        }

        let balance = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount {
                message: format!("Balance overflow refunding {}", amount),
            })?;

        Self::write_balance(&mut tx, user_id, balance).await?;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit refund"))?;

        Ok(RefundOutcome::Applied { balance })
    }
}
