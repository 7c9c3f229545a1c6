//! Permission resolution — the allow/deny decision procedure.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use civiam_core::catalog::actions;
use civiam_core::error::{CiviamError, CiviamResult};
use civiam_core::models::permission::Permission;
use civiam_core::models::role::Role;
use civiam_core::models::user_permission::{CreateUserPermission, OverrideType, UserPermission};
use civiam_core::repository::{
    CustomRoleRepository, PermissionRepository, RolePermissionRepository,
    UserPermissionRepository, UserRepository,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::check::PermissionCheck;

/// Effective permissions grouped by module, for UI gating. Each
/// permission contributes its dotted name and its bare action string.
pub type PermissionMap = BTreeMap<String, BTreeSet<String>>;

/// Permission resolution service.
///
/// Generic over repository implementations so that the decision
/// procedure has no dependency on the database crate. Stateless per
/// call: every check re-resolves from the store, and concurrent calls
/// are independent. Admin writes racing a check see whatever the
/// store's own isolation provides.
pub struct PermissionResolver<U, P, R, C, O> {
    users: U,
    permissions: P,
    role_permissions: R,
    custom_roles: C,
    overrides: O,
}

impl<U, P, R, C, O> PermissionResolver<U, P, R, C, O>
where
    U: UserRepository,
    P: PermissionRepository,
    R: RolePermissionRepository,
    C: CustomRoleRepository,
    O: UserPermissionRepository,
{
    pub fn new(users: U, permissions: P, role_permissions: R, custom_roles: C, overrides: O) -> Self {
        Self {
            users,
            permissions,
            role_permissions,
            custom_roles,
            overrides,
        }
    }

    /// May `user_id` exercise the requested capability?
    ///
    /// Never errors: storage failures deny (fail-closed) and log. The
    /// boolean does not distinguish a missing or inactive account from
    /// a missing capability, so account status cannot be probed
    /// through this check. Denial audit logging is the caller's job.
    pub async fn has_permission(&self, user_id: Uuid, check: &PermissionCheck) -> bool {
        match self.resolve(user_id, check).await {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(%user_id, %check, error = %err, "permission check failed, denying");
                false
            }
        }
    }

    async fn resolve(&self, user_id: Uuid, check: &PermissionCheck) -> CiviamResult<bool> {
        // 1. Account gate — unknown or deactivated users hold nothing.
        let user = match self.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(CiviamError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Ok(false);
        }

        // 2. Super admin bypass. Evaluated before overrides: revoke
        //    rows against a super admin are inert.
        if user.role.is_super_admin() {
            return Ok(true);
        }

        // 3. Target permission. An unseeded name here usually means a
        //    caller references a capability the catalog never defined.
        let Some(permission) = self.lookup(check).await? else {
            debug!(%user_id, %check, "unknown permission requested");
            return Ok(false);
        };
        if !permission.is_active {
            return Ok(false);
        }

        // 4. Exceptional overrides. Any revoke row is absolute — no
        //    coexisting grant shadows it, whatever their order.
        let overrides = self.overrides.overrides_for(user_id, permission.id).await?;
        if overrides
            .iter()
            .any(|o| o.override_type == OverrideType::Revoke)
        {
            return Ok(false);
        }
        let now = Utc::now();
        if overrides
            .iter()
            .any(|o| o.override_type == OverrideType::Grant && o.is_valid_at(now))
        {
            return Ok(true);
        }

        // 5. Role baseline.
        if self.role_permissions.exists(user.role, permission.id).await? {
            return Ok(true);
        }

        // 6. Active custom-role bundles.
        if self
            .custom_roles
            .active_grant_exists(user_id, permission.id)
            .await?
        {
            return Ok(true);
        }

        Ok(false)
    }

    async fn lookup(&self, check: &PermissionCheck) -> CiviamResult<Option<Permission>> {
        match check {
            PermissionCheck::Name(name) => self.permissions.find_by_name(name).await,
            PermissionCheck::ModuleAction { module, action } => {
                self.permissions.find_by_module_action(module, action).await
            }
        }
    }

    /// True iff at least one listed capability resolves true.
    /// Evaluates left to right, short-circuits on the first allow.
    pub async fn has_any_permission(&self, user_id: Uuid, checks: &[PermissionCheck]) -> bool {
        for check in checks {
            if self.has_permission(user_id, check).await {
                return true;
            }
        }
        false
    }

    /// True iff every listed capability resolves true.
    /// Short-circuits on the first deny.
    pub async fn has_all_permissions(&self, user_id: Uuid, checks: &[PermissionCheck]) -> bool {
        for check in checks {
            if !self.has_permission(user_id, check).await {
                return false;
            }
        }
        true
    }

    /// Module-level visibility: `read` or `manage` on the module.
    pub async fn can_access_module(&self, user_id: Uuid, module: &str) -> bool {
        let read = PermissionCheck::module_action(module, actions::READ);
        if self.has_permission(user_id, &read).await {
            return true;
        }
        let manage = PermissionCheck::module_action(module, actions::MANAGE);
        self.has_permission(user_id, &manage).await
    }

    /// Union of the user's effective permissions, grouped by module.
    ///
    /// For display and UI gating only — enforcement always goes
    /// through [`has_permission`](Self::has_permission). Empty for
    /// missing or inactive users, and on storage failure (fail-closed,
    /// logged).
    pub async fn user_permission_map(&self, user_id: Uuid) -> PermissionMap {
        match self.collect_permission_map(user_id).await {
            Ok(map) => map,
            Err(err) => {
                warn!(%user_id, error = %err, "permission aggregation failed, returning empty");
                PermissionMap::new()
            }
        }
    }

    async fn collect_permission_map(&self, user_id: Uuid) -> CiviamResult<PermissionMap> {
        let user = match self.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(CiviamError::NotFound { .. }) => return Ok(PermissionMap::new()),
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Ok(PermissionMap::new());
        }

        let mut map = PermissionMap::new();

        if user.role.is_super_admin() {
            for permission in self.permissions.list_active().await? {
                insert_permission(&mut map, &permission);
            }
            return Ok(map);
        }

        // A revoked permission drops out of the aggregate even where
        // the role or a custom role would otherwise contribute it.
        let revoked: HashSet<Uuid> = self
            .overrides
            .list_revoked_ids(user_id)
            .await?
            .into_iter()
            .collect();

        for permission in self.role_permissions.list_for_role(user.role).await? {
            if permission.is_active && !revoked.contains(&permission.id) {
                insert_permission(&mut map, &permission);
            }
        }

        for permission in self.custom_roles.list_permissions_for_user(user_id).await? {
            if permission.is_active && !revoked.contains(&permission.id) {
                insert_permission(&mut map, &permission);
            }
        }

        for grant in self.overrides.list_valid_grants(user_id).await? {
            if revoked.contains(&grant.permission_id) {
                continue;
            }
            let permission = self.permissions.get_by_id(grant.permission_id).await?;
            if permission.is_active {
                insert_permission(&mut map, &permission);
            }
        }

        Ok(map)
    }

    // -------------------------------------------------------------------
    // Administrative mutations. Unlike the read paths these propagate
    // errors; the HTTP layer translates them into error responses.
    // -------------------------------------------------------------------

    /// Append an exceptional grant. `expires_at = None` is permanent.
    ///
    /// Earlier rows for the pair are left untouched — the log keeps
    /// the full grant/revoke history, and resolution precedence makes
    /// coexisting rows safe.
    pub async fn grant_permission(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
        granted_by: Uuid,
        reason: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> CiviamResult<UserPermission> {
        self.overrides
            .insert(CreateUserPermission {
                user_id,
                permission_id,
                override_type: OverrideType::Grant,
                reason,
                expires_at,
                granted_by: Some(granted_by),
            })
            .await
    }

    /// Append an exceptional revoke. Absolute for the pair until
    /// removed with [`remove_user_permission`](Self::remove_user_permission).
    pub async fn revoke_permission(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
        reason: Option<String>,
    ) -> CiviamResult<UserPermission> {
        self.overrides
            .insert(CreateUserPermission {
                user_id,
                permission_id,
                override_type: OverrideType::Revoke,
                reason,
                expires_at: None,
                granted_by: None,
            })
            .await
    }

    /// Delete every override row for the pair, returning the user to
    /// whatever the role and custom-role layers decide.
    pub async fn remove_user_permission(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> CiviamResult<()> {
        self.overrides.delete_overrides(user_id, permission_id).await
    }

    /// Replace a role's entire baseline permission set.
    pub async fn sync_role_permissions(
        &self,
        role: Role,
        permission_ids: Vec<Uuid>,
    ) -> CiviamResult<()> {
        info!(%role, count = permission_ids.len(), "Replacing role permission set");
        self.role_permissions.replace_for_role(role, permission_ids).await
    }

    pub async fn get_role_permissions(&self, role: Role) -> CiviamResult<Vec<Permission>> {
        self.role_permissions.list_for_role(role).await
    }

    /// Raw override history for a user — audit view, expired and
    /// superseded rows included.
    pub async fn list_user_overrides(&self, user_id: Uuid) -> CiviamResult<Vec<UserPermission>> {
        self.overrides.list_for_user(user_id).await
    }
}

fn insert_permission(map: &mut PermissionMap, permission: &Permission) {
    let entry = map.entry(permission.module.clone()).or_default();
    entry.insert(permission.name.as_str().to_string());
    entry.insert(permission.action.clone());
}
