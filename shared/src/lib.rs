//! Shared utilities and common types for the SmsVerify server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types and layered loading
//! - Error codes and the API response envelope
//! - Utility functions (phone masking, input validation)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, Environment, LifecycleConfig,
    LoggingConfig, PollingConfig, ProviderConfig, ProviderKind, ServerConfig, StorageBackend,
};
pub use errors::{error_codes, ErrorResponse};
pub use types::{ApiResponse, HealthResponse};
pub use utils::{phone, validation};
