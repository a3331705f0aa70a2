//! Audit service module for recording verification lifecycle and billing events.

mod service;

pub use service::{AuditService, AuditServiceConfig};
