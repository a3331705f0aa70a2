//! Credit ledger module.

mod memory;
mod traits;


pub use memory::{InMemoryCreditLedger, LedgerEntry, LedgerEntryKind};
pub use traits::{CreditLedger, RefundOutcome};
