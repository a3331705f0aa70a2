//! Request and response bodies for the HTTP API

pub mod account;
pub mod admin;
pub mod verification;

pub use account::BalanceResponse;
pub use admin::{ActivityQuery, BulkCancelRequest, BulkCancelResponse};
pub use verification::{
    CreateVerificationBody, ListQuery, PollBatchResponse, PollFailureResponse, VerificationResponse,
};
