//! Verification lifecycle module
//!
//! This module orchestrates the purchase of temporary numbers:
//! - Creation: debit the price, request a number, store a pending record
//! - Polling: query the provider and merge the result into the record
//! - Termination: cancel or fail, refunding the cost exactly once
//! - Admin bulk cancel and background refund reconciliation

mod config;
mod pricing;
mod service;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use config::LifecycleServiceConfig;
pub use pricing::PriceList;
pub use service::VerificationLifecycleService;
pub use traits::SmsProvider;
pub use types::{
    BulkCancelResult, CreateVerificationRequest, NumberAssignment, NumberRequestOptions,
    PollBatchResult, PollFailure, ProviderState, ProviderStatus, ReconcileResult,
};
