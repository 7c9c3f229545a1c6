//! CIVIAM Authz — permission resolution for the municipal platform.
//!
//! [`PermissionResolver`] composes role baselines, custom-role bundles,
//! and per-user exceptional overrides into allow/deny decisions, with
//! revocations absolute and a super-admin bypass ahead of everything.
//! Read paths are fail-closed: a storage failure denies (or returns an
//! empty aggregate) and logs rather than surfacing an error.

pub mod check;
pub mod resolver;

pub use check::PermissionCheck;
pub use resolver::{PermissionMap, PermissionResolver};
