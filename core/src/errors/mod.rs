//! Domain-specific error types and error handling.

mod types;


// Re-export all error types
pub use types::{LedgerError, ProviderError, VerificationError};

use sv_shared::errors::{error_codes, ErrorResponse};
use thiserror::Error;

use crate::domain::value_objects::MoneyError;

/// Core domain errors (general purpose)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl DomainError {
    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => error_codes::VALIDATION_ERROR,
            Self::NotFound { .. } => error_codes::NOT_FOUND,
            Self::Unauthorized => error_codes::UNAUTHORIZED,
            Self::Forbidden { .. } => error_codes::FORBIDDEN,
            Self::Internal { .. } => error_codes::INTERNAL_ERROR,
            Self::Ledger(e) => e.error_code(),
            Self::Verification(e) => e.error_code(),
            Self::Provider(e) => e.error_code(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<MoneyError> for DomainError {
    fn from(error: MoneyError) -> Self {
        DomainError::Ledger(LedgerError::InvalidAmount {
            message: error.to_string(),
        })
    }
}

impl From<DomainError> for ErrorResponse {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Ledger(e) => e.into(),
            DomainError::Verification(e) => e.into(),
            DomainError::Provider(e) => e.into(),
            // Internal details stay in the logs
            DomainError::Internal { .. } => {
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "Internal server error")
            }
            other => ErrorResponse::new(other.error_code(), other.to_string()),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
