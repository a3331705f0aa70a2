//! Repository interfaces and their in-memory implementations.
//!
//! Relational implementations of the ledger and the record store live in
//! the infrastructure crate.

pub mod audit;
pub mod ledger;
pub mod verification;

pub use audit::{AuditLogRepository, RingBufferAuditLog};
pub use ledger::{CreditLedger, InMemoryCreditLedger, LedgerEntry, LedgerEntryKind, RefundOutcome};
pub use verification::{InMemoryVerificationRepository, TransitionOutcome, VerificationRepository};
