//! Polling worker for periodic status refresh and refund reconciliation
//!
//! Each cycle polls the oldest active verifications across all users and
//! then retries refunds that were never stamped.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use sv_shared::config::PollingConfig;

use crate::errors::DomainError;
use crate::services::lifecycle::VerificationLifecycleService;

/// Configuration for the polling worker
#[derive(Debug, Clone)]
pub struct PollingWorkerConfig {
    /// How often to run a cycle (in seconds)
    pub interval_seconds: u64,
    /// Maximum active verifications polled per cycle
    pub batch_size: usize,
    /// Maximum unsettled refunds retried per cycle
    pub reconcile_batch_size: usize,
    /// Whether to run the worker at all
    pub enabled: bool,
}

impl Default for PollingWorkerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 10,
            batch_size: 100,
            reconcile_batch_size: 50,
            enabled: true,
        }
    }
}

impl From<&PollingConfig> for PollingWorkerConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval_seconds: config.interval_seconds.max(1),
            batch_size: config.batch_size,
            reconcile_batch_size: config.reconcile_batch_size,
            enabled: config.enabled,
        }
    }
}

/// Worker driving the lifecycle service without client requests
pub struct PollingWorker {
    service: Arc<VerificationLifecycleService>,
    config: PollingWorkerConfig,
}

impl PollingWorker {
    /// Create a new polling worker
    pub fn new(service: Arc<VerificationLifecycleService>, config: PollingWorkerConfig) -> Self {
        Self { service, config }
    }

    /// Run a single cycle
    ///
    /// A failure in one step is recorded in the result and does not skip
    /// the other step.
    pub async fn run_cycle(&self) -> Result<PollingCycleResult, DomainError> {
        if !self.config.enabled {
            return Ok(PollingCycleResult::default());
        }

        let mut result = PollingCycleResult::default();

        match self.service.poll_active_batch(self.config.batch_size).await {
            Ok(batch) => {
                result.polled = batch.results.len();
                result.finished = batch.terminal_count();
                result.poll_errors = batch.errors.len();
            }
            Err(e) => {
                error!("Failed to poll active verifications: {}", e);
                result.errors.push(format!("Poll error: {}", e));
            }
        }

        match self
            .service
            .reconcile_refunds(self.config.reconcile_batch_size)
            .await
        {
            Ok(reconciled) => {
                result.refunds_settled = reconciled.refunded + reconciled.already_applied;
                result.refunds_pending = reconciled.failed;
            }
            Err(e) => {
                error!("Failed to reconcile refunds: {}", e);
                result.errors.push(format!("Reconcile error: {}", e));
            }
        }

        if result.polled > 0 || result.refunds_settled > 0 {
            info!(
                "Polling cycle completed - Polled: {}, Finished: {}, Provider errors: {}, Refunds settled: {}",
                result.polled, result.finished, result.poll_errors, result.refunds_settled
            );
        }

        Ok(result)
    }

    /// Start the worker as a background task
    ///
    /// Returns `None` when the worker is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Polling worker is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                "Polling worker started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval_timer.tick().await;

                match self.run_cycle().await {
                    Ok(result) => {
                        if !result.errors.is_empty() {
                            warn!("Polling cycle completed with errors: {:?}", result.errors);
                        }
                    }
                    Err(e) => {
                        error!("Polling cycle failed: {}", e);
                    }
                }
            }
        }))
    }
}

/// Result of one polling cycle
#[derive(Debug, Default)]
pub struct PollingCycleResult {
    /// Active verifications polled
    pub polled: usize,
    /// Polled verifications that ended in a terminal state
    pub finished: usize,
    /// Per-record provider or storage errors
    pub poll_errors: usize,
    /// Refunds credited or stamped by reconciliation
    pub refunds_settled: usize,
    /// Refunds still failing after reconciliation
    pub refunds_pending: usize,
    /// Step-level errors encountered during the cycle
    pub errors: Vec<String>,
}

impl PollingCycleResult {
    /// Check if the cycle was successful (no step-level errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
