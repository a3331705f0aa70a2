//! Caller identity passed explicitly into every lifecycle operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Authenticated caller of a lifecycle operation
///
/// The core trusts this value; establishing it (token verification) is the
/// job of the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl SessionContext {
    /// Context for a regular user
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// Context for an administrator
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Whether the caller may read or act on a record owned by `owner`
    pub fn can_act_for(&self, owner: Uuid) -> bool {
        self.is_admin || self.user_id == owner
    }

    /// Capability check for operations on other users' records
    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(DomainError::Forbidden {
                message: "Administrator privileges required".to_string(),
            })
        }
    }
}
