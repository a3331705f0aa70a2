//! Verification record store module.

mod memory;
mod traits;


pub use memory::InMemoryVerificationRepository;
pub use traits::{TransitionOutcome, VerificationRepository};
