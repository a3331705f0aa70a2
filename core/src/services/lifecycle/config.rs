//! Configuration for the lifecycle service

use std::time::Duration;

use sv_shared::config::LifecycleConfig;

/// Configuration for the lifecycle service
#[derive(Debug, Clone)]
pub struct LifecycleServiceConfig {
    /// Deadline for a single provider call
    pub provider_timeout: Duration,
    /// Non-terminal records older than this are failed and refunded
    pub max_lifetime: chrono::Duration,
    /// Upper bound on listing sizes
    pub max_list_limit: usize,
}

impl Default for LifecycleServiceConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(5),
            max_lifetime: chrono::Duration::minutes(20),
            max_list_limit: 100,
        }
    }
}

impl From<&LifecycleConfig> for LifecycleServiceConfig {
    fn from(config: &LifecycleConfig) -> Self {
        Self {
            provider_timeout: Duration::from_millis(config.provider_timeout_ms),
            max_lifetime: chrono::Duration::minutes(config.max_lifetime_minutes),
            max_list_limit: config.max_list_limit.max(1),
        }
    }
}

impl LifecycleServiceConfig {
    /// Clamp a caller-supplied listing size into `1..=max_list_limit`
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.max_list_limit)
            .clamp(1, self.max_list_limit)
    }
}
