//! Custom role domain model.
//!
//! A custom role is an admin-defined, named permission bundle assigned
//! to users independently of their fixed [`Role`](crate::models::role::Role).
//! A user inherits the union of the permission sets of all active custom
//! roles assigned to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRole {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Inactive custom roles contribute nothing to resolution.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomRole {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCustomRole {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
