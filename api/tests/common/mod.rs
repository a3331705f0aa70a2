//! Shared fixtures for the HTTP tests: in-memory backends, mock provider and
//! token minting.

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use jsonwebtoken::{encode, EncodingKey, Header};
use sv_api::middleware::AccessClaims;
use sv_api::AppState;
use sv_core::domain::value_objects::Money;
use sv_core::repositories::{InMemoryCreditLedger, InMemoryVerificationRepository, RingBufferAuditLog};
use sv_core::services::audit::{AuditService, AuditServiceConfig};
use sv_core::services::lifecycle::{LifecycleServiceConfig, PriceList, VerificationLifecycleService};
use sv_infra::provider::MockSmsProvider;
use sv_shared::AppConfig;
use uuid::Uuid;

pub const SECRET: &str = "http-test-secret";

pub struct TestContext {
    pub config: AppConfig,
    pub state: web::Data<AppState>,
    pub ledger: Arc<InMemoryCreditLedger>,
    pub provider: Arc<MockSmsProvider>,
    pub user_id: Uuid,
    pub admin_id: Uuid,
}

pub fn money(value: &str) -> Money {
    Money::parse(value).unwrap()
}

impl TestContext {
    /// One user holding `balance`, one admin, a price of 1.00 and a mock
    /// provider that delivers the code on the second poll
    pub fn new(balance: &str) -> Self {
        Self::with_provider(balance, MockSmsProvider::new(1))
    }

    pub fn with_provider(balance: &str, provider: MockSmsProvider) -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = SECRET.to_string();

        let user_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();
        let ledger = Arc::new(
            InMemoryCreditLedger::new()
                .with_account(user_id, money(balance))
                .with_account(admin_id, money("0.00")),
        );
        let provider = Arc::new(provider);

        let audit = Arc::new(AuditService::new(
            Arc::new(RingBufferAuditLog::new(100)),
            AuditServiceConfig { async_writes: false },
        ));
        let lifecycle = VerificationLifecycleService::new(
            ledger.clone(),
            Arc::new(InMemoryVerificationRepository::new()),
            provider.clone(),
            audit,
            PriceList::from_config(&config.lifecycle).unwrap(),
            LifecycleServiceConfig::from(&config.lifecycle),
        );

        Self {
            state: web::Data::new(AppState::new(Arc::new(lifecycle))),
            config,
            ledger,
            provider,
            user_id,
            admin_id,
        }
    }

    pub fn user_token(&self) -> String {
        token_for(self.user_id, false)
    }

    pub fn admin_token(&self) -> String {
        token_for(self.admin_id, true)
    }

    pub fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }
}

pub fn token_for(user_id: Uuid, is_admin: bool) -> String {
    let claims = AccessClaims {
        sub: user_id.to_string(),
        is_admin,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        iss: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}
