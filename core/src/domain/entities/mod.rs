//! Domain entities representing core business objects.

pub mod audit;
pub mod verification;

// Re-export commonly used types
pub use audit::{AuditEventType, AuditLog};
pub use verification::{StatusUpdate, Verification, VerificationStatus};
