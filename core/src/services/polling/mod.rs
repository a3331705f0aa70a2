//! Background polling of active verifications and refund reconciliation.

mod worker;

pub use worker::{PollingCycleResult, PollingWorker, PollingWorkerConfig};

#[cfg(test)]
mod tests;
