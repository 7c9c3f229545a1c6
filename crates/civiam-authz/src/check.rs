//! Capability request forms.

use std::fmt;

use civiam_core::error::CiviamResult;
use civiam_core::models::permission::PermissionName;

/// A capability requested from the resolver — either the fully
/// qualified dotted name, or the legacy (module, action) pair.
///
/// The pair form may be ambiguous across features of one module; the
/// store resolves ties by lowest dotted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionCheck {
    Name(PermissionName),
    ModuleAction { module: String, action: String },
}

impl PermissionCheck {
    /// Fully qualified form; validates the dotted name.
    pub fn name(name: impl Into<String>) -> CiviamResult<Self> {
        Ok(Self::Name(PermissionName::parse(name)?))
    }

    /// Legacy (module, action) form.
    pub fn module_action(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self::ModuleAction {
            module: module.into(),
            action: action.into(),
        }
    }
}

impl From<PermissionName> for PermissionCheck {
    fn from(name: PermissionName) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for PermissionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name.as_str()),
            Self::ModuleAction { module, action } => write!(f, "{module}:{action}"),
        }
    }
}
