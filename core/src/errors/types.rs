//! Error types for the ledger, the record store and the SMS provider
//!
//! Each variant maps to a stable SCREAMING_SNAKE_CASE code through
//! `error_code()`; the HTTP status is chosen in the presentation layer.

use sv_shared::errors::{error_codes, ErrorResponse};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::VerificationStatus;
use crate::domain::value_objects::Money;

/// Credit ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Money, available: Money },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: Uuid },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },
}

impl LedgerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => error_codes::INSUFFICIENT_FUNDS,
            Self::UserNotFound { .. } => error_codes::USER_NOT_FOUND,
            Self::InvalidAmount { .. } => error_codes::INVALID_AMOUNT,
        }
    }
}

impl From<LedgerError> for ErrorResponse {
    fn from(error: LedgerError) -> Self {
        let response = ErrorResponse::new(error.error_code(), error.to_string());
        match error {
            LedgerError::InsufficientFunds { required, available } => response
                .add_detail("required", required)
                .add_detail("available", available),
            _ => response,
        }
    }
}

/// Verification record errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Verification not found: {id}")]
    NotFound { id: Uuid },

    #[error("Verification already exists: {id}")]
    DuplicateId { id: Uuid },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: VerificationStatus,
        to: VerificationStatus,
    },
}

impl VerificationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => error_codes::VERIFICATION_NOT_FOUND,
            Self::DuplicateId { .. } => error_codes::DUPLICATE_ID,
            Self::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
        }
    }
}

impl From<VerificationError> for ErrorResponse {
    fn from(error: VerificationError) -> Self {
        let response = ErrorResponse::new(error.error_code(), error.to_string());
        match error {
            VerificationError::InvalidTransition { from, to } => response
                .add_detail("from", from)
                .add_detail("to", to),
            _ => response,
        }
    }
}

/// SMS provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("SMS provider unavailable: {message}")]
    Unavailable { message: String },

    #[error("No numbers available for {service} in {country}")]
    NoNumbersAvailable { service: String, country: String },

    #[error("SMS provider timed out")]
    Timeout,

    #[error("SMS provider error: {0}")]
    Error(String),
}

impl ProviderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => error_codes::PROVIDER_UNAVAILABLE,
            Self::NoNumbersAvailable { .. } => error_codes::NO_NUMBERS_AVAILABLE,
            Self::Timeout => error_codes::PROVIDER_TIMEOUT,
            Self::Error(_) => error_codes::PROVIDER_ERROR,
        }
    }
}

impl From<ProviderError> for ErrorResponse {
    fn from(error: ProviderError) -> Self {
        ErrorResponse::new(error.error_code(), error.to_string())
    }
}
