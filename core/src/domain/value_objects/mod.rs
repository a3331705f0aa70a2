//! Value objects shared by entities and services.

pub mod money;
pub mod session;

pub use money::{Money, MoneyError, MONEY_SCALE};
pub use session::SessionContext;
