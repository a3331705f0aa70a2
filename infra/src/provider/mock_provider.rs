//! Mock SMS Provider Implementation
//!
//! A development provider that hands out fake US numbers and "receives" a
//! random six-digit code after a configurable number of polls.

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};

use sv_core::domain::value_objects::Money;
use sv_core::errors::ProviderError;
use sv_core::services::lifecycle::{
    NumberAssignment, NumberRequestOptions, ProviderStatus, SmsProvider,
};
use sv_shared::phone::mask_phone_number;

#[derive(Debug, Clone)]
enum Rental {
    Active { polls: u32, code: Option<String> },
    Cancelled,
}

/// Mock SMS provider for development and testing
///
/// This implementation:
/// - Assigns `mock-N` activation IDs and `+1555` numbers
/// - Reports `waiting` for `polls_before_code` polls, then `received`
/// - Can simulate an outage where every call fails with `Unavailable`
pub struct MockSmsProvider {
    polls_before_code: u32,
    cost: Money,
    next_id: AtomicU64,
    simulate_outage: AtomicBool,
    rentals: Mutex<HashMap<String, Rental>>,
}

impl MockSmsProvider {
    /// Create a mock provider delivering a code on the `polls_before_code + 1`th poll
    pub fn new(polls_before_code: u32) -> Self {
        Self {
            polls_before_code,
            cost: Money::from_cents(50).unwrap_or_default(),
            next_id: AtomicU64::new(0),
            simulate_outage: AtomicBool::new(false),
            rentals: Mutex::new(HashMap::new()),
        }
    }

    /// Enable or disable outage simulation
    pub fn set_simulate_outage(&self, simulate: bool) {
        self.simulate_outage.store(simulate, Ordering::SeqCst);
    }

    /// Number of numbers handed out so far
    pub fn rented_count(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.simulate_outage.load(Ordering::SeqCst) {
            warn!(provider = "mock", "Mock provider simulating outage");
            return Err(ProviderError::Unavailable {
                message: "Simulated provider outage".to_string(),
            });
        }
        Ok(())
    }

    fn rentals(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Rental>>, ProviderError> {
        self.rentals
            .lock()
            .map_err(|_| ProviderError::Error("Mock provider state poisoned".to_string()))
    }
}

impl Default for MockSmsProvider {
    fn default() -> Self {
        Self::new(2)
    }
}

#[async_trait]
impl SmsProvider for MockSmsProvider {
    async fn request_number(
        &self,
        service: &str,
        country: &str,
        options: &NumberRequestOptions,
    ) -> Result<NumberAssignment, ProviderError> {
        self.check_available()?;

        let sequence = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let activation_id = format!("mock-{}", sequence);
        let area_code = options.area_code.as_deref().unwrap_or("555");
        let phone_number = {
            let mut rng = rand::thread_rng();
            format!("+1{}{:07}", area_code, rng.gen_range(0..10_000_000u32))
        };

        self.rentals()?.insert(
            activation_id.clone(),
            Rental::Active {
                polls: 0,
                code: None,
            },
        );

        info!(
            provider = "mock",
            activation_id = %activation_id,
            service = %service,
            country = %country,
            phone = %mask_phone_number(&phone_number),
            "Mock number assigned"
        );

        Ok(NumberAssignment {
            activation_id,
            phone_number,
            cost: self.cost,
        })
    }

    async fn get_status(&self, activation_id: &str) -> Result<ProviderStatus, ProviderError> {
        self.check_available()?;

        let mut rentals = self.rentals()?;
        let rental = rentals
            .get_mut(activation_id)
            .ok_or_else(|| ProviderError::Error(format!("Unknown activation {}", activation_id)))?;

        match rental {
            Rental::Cancelled => Ok(ProviderStatus::cancelled()),
            Rental::Active { polls, code } => {
                if let Some(code) = code {
                    return Ok(ProviderStatus::received(code.clone(), None));
                }

                *polls += 1;
                if *polls <= self.polls_before_code {
                    return Ok(ProviderStatus::waiting());
                }

                let delivered = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32));
                *code = Some(delivered.clone());
                let text = format!("Your verification code is {}", delivered);
                Ok(ProviderStatus::received(delivered, Some(text)))
            }
        }
    }

    async fn cancel_number(&self, activation_id: &str) -> Result<(), ProviderError> {
        self.check_available()?;

        let mut rentals = self.rentals()?;
        match rentals.get_mut(activation_id) {
            Some(rental) => {
                *rental = Rental::Cancelled;
                Ok(())
            }
            None => Err(ProviderError::Error(format!(
                "Unknown activation {}",
                activation_id
            ))),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
