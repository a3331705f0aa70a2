use serde::{Deserialize, Serialize};
use sv_core::domain::value_objects::Money;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub credits: Money,
}
