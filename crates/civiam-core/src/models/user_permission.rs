//! Per-user exceptional permission overrides.
//!
//! Overrides are an append-only log: grant and revoke actions insert
//! new rows and never rewrite earlier ones, so multiple rows may exist
//! for the same (user, permission) pair. Precedence is decided at
//! resolution time — any revoke row is absolute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverrideType {
    Grant,
    Revoke,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub permission_id: Uuid,
    pub override_type: OverrideType,
    pub reason: Option<String>,
    /// Grants only; `None` means permanent. Ignored on revokes —
    /// a revoke never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Admin user who recorded the override.
    pub granted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UserPermission {
    /// Whether this row still contributes to resolution at `now`.
    /// Expired grants are treated as absent; revokes never expire.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.override_type {
            OverrideType::Revoke => true,
            OverrideType::Grant => self.expires_at.is_none_or(|t| t > now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserPermission {
    pub user_id: Uuid,
    pub permission_id: Uuid,
    pub override_type: OverrideType,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub granted_by: Option<Uuid>,
}
