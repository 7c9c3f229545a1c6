//! Permission domain model.
//!
//! A permission is identified by a dotted name — `module.feature.action`,
//! or `module.action` for module-level capabilities. The name is the
//! stable, globally unique identity referenced by role sets and per-user
//! overrides; the split components are stored alongside it to serve the
//! legacy (module, action) lookup path.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CiviamError, CiviamResult};

/// Validated dotted permission identifier.
///
/// At least two non-empty dot-separated segments: the first is the
/// module, the last is the action, anything in between is the feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(String);

impl PermissionName {
    pub fn parse(name: impl Into<String>) -> CiviamResult<Self> {
        let name = name.into();
        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
            return Err(CiviamError::Validation {
                message: format!("invalid permission name: {name:?}"),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First segment.
    pub fn module(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Last segment.
    pub fn action(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Middle segments, `None` for two-segment names.
    pub fn feature(&self) -> Option<&str> {
        let first_dot = self.0.find('.')?;
        let last_dot = self.0.rfind('.')?;
        if first_dot == last_dot {
            return None;
        }
        Some(&self.0[first_dot + 1..last_dot])
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PermissionName {
    type Err = CiviamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = CiviamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PermissionName> for String {
    fn from(name: PermissionName) -> Self {
        name.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: PermissionName,
    pub module: String,
    pub feature: Option<String>,
    pub action: String,
    pub display_name: String,
    pub category: String,
    /// Inactive permissions stay in storage for audit but are excluded
    /// from resolution and aggregation.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for the bulk upsert-by-name seeding path.
///
/// `module`/`feature`/`action` are derived from the name by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertPermission {
    pub name: PermissionName,
    pub display_name: String,
    pub category: String,
}
