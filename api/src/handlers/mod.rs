pub mod error;

pub use error::{ApiError, status_for};
