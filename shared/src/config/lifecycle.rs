//! Verification lifecycle configuration
//!
//! Prices are fixed-point decimals; they are converted into validated
//! money values by the core crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle controller configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Price charged when a service has no override
    pub default_price: Decimal,

    /// Per-service price overrides keyed by lowercase service name
    pub service_prices: HashMap<String, Decimal>,

    /// Deadline for a single provider call in milliseconds
    pub provider_timeout_ms: u64,

    /// Non-terminal verifications older than this are failed and refunded
    pub max_lifetime_minutes: i64,

    /// Maximum history entries returned per listing
    pub max_list_limit: usize,

    /// Capacity of the in-memory activity ring buffer
    pub audit_capacity: usize,

    /// Background polling
    pub polling: PollingConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_price: Decimal::new(100, 2),
            service_prices: HashMap::new(),
            provider_timeout_ms: 5_000,
            max_lifetime_minutes: 20,
            max_list_limit: 100,
            audit_capacity: 1_000,
            polling: PollingConfig::default(),
        }
    }
}

impl LifecycleConfig {
    /// Validate prices and limits
    pub fn validate(&self) -> Result<(), String> {
        if self.default_price.is_sign_negative() {
            return Err("lifecycle.default_price must not be negative".to_string());
        }
        if let Some((service, _)) = self
            .service_prices
            .iter()
            .find(|(_, price)| price.is_sign_negative())
        {
            return Err(format!("lifecycle.service_prices.{} must not be negative", service));
        }
        if self.provider_timeout_ms == 0 {
            return Err("lifecycle.provider_timeout_ms must be positive".to_string());
        }
        if self.max_lifetime_minutes <= 0 {
            return Err("lifecycle.max_lifetime_minutes must be positive".to_string());
        }
        if self.audit_capacity == 0 {
            return Err("lifecycle.audit_capacity must be positive".to_string());
        }
        Ok(())
    }
}

/// Background polling worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Whether the worker runs at all
    pub enabled: bool,

    /// Seconds between cycles
    pub interval_seconds: u64,

    /// Active verifications polled per cycle
    pub batch_size: usize,

    /// Unsettled refunds retried per cycle
    pub reconcile_batch_size: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 10,
            batch_size: 100,
            reconcile_batch_size: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifecycle_is_valid() {
        let config = LifecycleConfig::default();
        assert_eq!(config.default_price.to_string(), "1.00");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_override_rejected() {
        let mut config = LifecycleConfig::default();
        config
            .service_prices
            .insert("whatsapp".to_string(), Decimal::new(-50, 2));
        let error = config.validate().unwrap_err();
        assert!(error.contains("whatsapp"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = LifecycleConfig {
            provider_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
