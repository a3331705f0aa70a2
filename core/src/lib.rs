//! # SmsVerify Core
//!
//! Core business logic and domain layer for the SmsVerify backend.
//! This crate contains the domain entities, the credit ledger and
//! verification record store interfaces with in-memory implementations,
//! the verification lifecycle service and the error types that form the
//! foundation of the application.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
