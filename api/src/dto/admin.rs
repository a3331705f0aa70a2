use serde::{Deserialize, Serialize};
use sv_core::domain::value_objects::Money;
use sv_core::services::lifecycle::BulkCancelResult;
use uuid::Uuid;
use validator::Validate;

/// Body of `POST /api/v1/admin/verifications/bulk-cancel`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkCancelRequest {
    #[validate(length(min = 1, max = 1000))]
    pub verification_ids: Vec<Uuid>,
}

/// Only aggregates are reported; skipped IDs are not itemised
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCancelResponse {
    pub cancelled_count: usize,
    pub total_refunded: Money,
}

impl From<BulkCancelResult> for BulkCancelResponse {
    fn from(result: BulkCancelResult) -> Self {
        Self {
            cancelled_count: result.cancelled_count,
            total_refunded: result.total_refunded,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ActivityQuery {
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}
