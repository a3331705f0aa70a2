//! Price list for verification purchases

use std::collections::HashMap;

use sv_shared::config::LifecycleConfig;
use sv_shared::validation::normalize_service_name;

use crate::domain::value_objects::Money;
use crate::errors::{DomainError, DomainResult};

/// Charged price per service
///
/// Service names are matched case-insensitively; unknown services pay the
/// default price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceList {
    default_price: Money,
    overrides: HashMap<String, Money>,
}

impl PriceList {
    /// A price list charging the same price for every service
    pub fn flat(default_price: Money) -> Self {
        Self {
            default_price,
            overrides: HashMap::new(),
        }
    }

    /// Add or replace a per-service price
    pub fn with_price(mut self, service: &str, price: Money) -> Self {
        self.overrides.insert(normalize_service_name(service), price);
        self
    }

    /// Build from configuration, validating every amount
    pub fn from_config(config: &LifecycleConfig) -> DomainResult<Self> {
        let default_price = Money::new(config.default_price).map_err(|e| {
            DomainError::validation(format!("Invalid default price: {}", e))
        })?;

        let mut prices = Self::flat(default_price);
        for (service, price) in &config.service_prices {
            let price = Money::new(*price).map_err(|e| {
                DomainError::validation(format!("Invalid price for {}: {}", service, e))
            })?;
            prices = prices.with_price(service, price);
        }
        Ok(prices)
    }

    /// Price charged for `service`
    pub fn price_for(&self, service: &str) -> Money {
        self.overrides
            .get(&normalize_service_name(service))
            .copied()
            .unwrap_or(self.default_price)
    }

    pub fn default_price(&self) -> Money {
        self.default_price
    }
}

impl Default for PriceList {
    fn default() -> Self {
        Self::flat(Money::from_cents(100).unwrap_or_default())
    }
}
