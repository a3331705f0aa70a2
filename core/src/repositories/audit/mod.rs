//! Audit log repository module.

mod traits;
pub use traits::AuditLogRepository;

mod ring_buffer;
pub use ring_buffer::RingBufferAuditLog;

#[cfg(test)]
mod tests;
