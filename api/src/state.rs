//! Shared application state and its construction from configuration

use std::sync::Arc;

use sv_core::domain::value_objects::Money;
use sv_core::repositories::{
    CreditLedger, InMemoryCreditLedger, InMemoryVerificationRepository, RingBufferAuditLog,
    VerificationRepository,
};
use sv_core::services::audit::{AuditService, AuditServiceConfig};
use sv_core::services::lifecycle::{LifecycleServiceConfig, PriceList, VerificationLifecycleService};
use sv_infra::database::{DatabasePool, MySqlCreditLedger, MySqlVerificationRepository};
use sv_infra::provider::create_provider;
use sv_infra::InfrastructureError;
use sv_shared::config::{AppConfig, DatabaseConfig, StorageBackend};
use uuid::Uuid;

/// State handed to every handler through `web::Data`
pub struct AppState {
    pub lifecycle: Arc<VerificationLifecycleService>,
    /// Present only with the MySQL backend
    pub database: Option<DatabasePool>,
}

impl AppState {
    /// State over an already assembled lifecycle service, without a database
    pub fn new(lifecycle: Arc<VerificationLifecycleService>) -> Self {
        Self {
            lifecycle,
            database: None,
        }
    }
}

/// Wire storage, provider and audit log together per configuration
pub async fn build_state(config: &AppConfig) -> Result<AppState, InfrastructureError> {
    let pricing = PriceList::from_config(&config.lifecycle)
        .map_err(|e| InfrastructureError::Config(e.to_string()))?;

    let audit = Arc::new(AuditService::new(
        Arc::new(RingBufferAuditLog::new(config.lifecycle.audit_capacity)),
        AuditServiceConfig::default(),
    ));
    let provider = create_provider(&config.provider);

    let (ledger, records, database): (
        Arc<dyn CreditLedger>,
        Arc<dyn VerificationRepository>,
        Option<DatabasePool>,
    ) = match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; balances and records are lost on restart");
            (
                Arc::new(seeded_ledger(&config.database)),
                Arc::new(InMemoryVerificationRepository::new()),
                None,
            )
        }
        StorageBackend::MySql => {
            let pool = DatabasePool::new(config.database.clone()).await?;
            if config.database.run_migrations {
                pool.run_migrations().await?;
            }
            (
                Arc::new(MySqlCreditLedger::new(pool.get_pool().clone())),
                Arc::new(MySqlVerificationRepository::new(pool.get_pool().clone())),
                Some(pool),
            )
        }
    };

    let lifecycle = VerificationLifecycleService::new(
        ledger,
        records,
        provider,
        audit,
        pricing,
        LifecycleServiceConfig::from(&config.lifecycle),
    );

    Ok(AppState {
        lifecycle: Arc::new(lifecycle),
        database,
    })
}

/// Memory ledger opened with the configured balances; bad entries are skipped
fn seeded_ledger(config: &DatabaseConfig) -> InMemoryCreditLedger {
    config
        .seed_accounts
        .iter()
        .fold(InMemoryCreditLedger::new(), |ledger, (user_id, credits)| {
            let user = match Uuid::parse_str(user_id) {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!(user_id = %user_id, "Ignoring seed account with invalid user ID");
                    return ledger;
                }
            };
            match Money::new(*credits) {
                Ok(balance) => {
                    tracing::info!(user_id = %user, balance = %balance, "Seeded account");
                    ledger.with_account(user, balance)
                }
                Err(e) => {
                    tracing::warn!(user_id = %user, error = %e, "Ignoring seed account with invalid balance");
                    ledger
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_seeded_ledger_skips_invalid_entries() {
        let valid = Uuid::new_v4();
        let mut config = DatabaseConfig::default();
        config.seed_accounts.insert(valid.to_string(), Decimal::new(1000, 2));
        config.seed_accounts.insert("not-a-uuid".to_string(), Decimal::new(500, 2));
        config
            .seed_accounts
            .insert(Uuid::new_v4().to_string(), Decimal::new(-100, 2));

        let ledger = seeded_ledger(&config);
        assert_eq!(ledger.get_balance(valid).await.unwrap().to_string(), "10.00");
    }

    #[tokio::test]
    async fn test_memory_backend_builds_without_database() {
        let state = build_state(&AppConfig::default()).await.unwrap();
        assert!(state.database.is_none());
        assert_eq!(state.lifecycle.pricing().default_price().to_string(), "1.00");
    }
}
