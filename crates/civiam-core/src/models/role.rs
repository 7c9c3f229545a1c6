//! Fixed platform roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CiviamError;

/// System-wide role carried by every user account.
///
/// The set is closed — municipal staff roles do not change at runtime.
/// Admin-extensible bundles are modeled separately as custom roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    Admin,
    Director,
    Coordinator,
    Employee,
    Auditor,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Director,
        Role::Coordinator,
        Role::Employee,
        Role::Auditor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
            Role::Director => "Director",
            Role::Coordinator => "Coordinator",
            Role::Employee => "Employee",
            Role::Auditor => "Auditor",
        }
    }

    /// Whether this role bypasses permission resolution entirely.
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CiviamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SuperAdmin" => Ok(Role::SuperAdmin),
            "Admin" => Ok(Role::Admin),
            "Director" => Ok(Role::Director),
            "Coordinator" => Ok(Role::Coordinator),
            "Employee" => Ok(Role::Employee),
            "Auditor" => Ok(Role::Auditor),
            other => Err(CiviamError::Validation {
                message: format!("unknown role: {other}"),
            }),
        }
    }
}
