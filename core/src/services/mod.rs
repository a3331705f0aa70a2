//! Business services containing domain logic and use cases.

pub mod audit;
pub mod lifecycle;
pub mod polling;

// Re-export commonly used types
pub use audit::{AuditService, AuditServiceConfig};
pub use lifecycle::{
    BulkCancelResult, CreateVerificationRequest, LifecycleServiceConfig, NumberAssignment,
    NumberRequestOptions, PollBatchResult, PollFailure, PriceList, ProviderState, ProviderStatus,
    ReconcileResult, SmsProvider, VerificationLifecycleService,
};
pub use polling::{PollingCycleResult, PollingWorker, PollingWorkerConfig};
