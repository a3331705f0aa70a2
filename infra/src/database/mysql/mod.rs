//! MySQL repository implementations

mod credit_ledger_impl;
mod rows;
mod verification_repository_impl;

pub use credit_ledger_impl::MySqlCreditLedger;
pub use verification_repository_impl::MySqlVerificationRepository;
