//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the SmsVerify backend.
//! It provides concrete implementations of the core's storage and provider
//! interfaces.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Database**: MySQL credit ledger and verification store using SQLx
//! - **Provider**: SMS number providers (TextVerified over HTTP, mock)
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

// Re-export core types for convenience
pub use sv_core::errors::*;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Provider module - Temporary number providers
pub mod provider;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::Internal {
            message: err.to_string(),
        }
    }
}
