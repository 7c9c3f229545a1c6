//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The resolver in `civiam-authz`
//! is generic over these traits, so it carries no dependency on any
//! particular storage backend.

use uuid::Uuid;

use crate::error::CiviamResult;
use crate::models::{
    custom_role::{CreateCustomRole, CustomRole, UpdateCustomRole},
    permission::{Permission, PermissionName, UpsertPermission},
    role::Role,
    user::{CreateUser, UpdateUser, User},
    user_permission::{CreateUserPermission, UserPermission},
};

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = CiviamResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CiviamResult<User>> + Send;
    fn get_by_username(&self, username: &str) -> impl Future<Output = CiviamResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = CiviamResult<User>> + Send;
}

pub trait PermissionRepository: Send + Sync {
    /// Bulk upsert by name — the catalog seeding path. Existing rows
    /// keep their id and active flag; display name and category are
    /// refreshed. New rows are created active.
    fn upsert_many(
        &self,
        inputs: Vec<UpsertPermission>,
    ) -> impl Future<Output = CiviamResult<Vec<Permission>>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CiviamResult<Permission>> + Send;

    fn find_by_name(
        &self,
        name: &PermissionName,
    ) -> impl Future<Output = CiviamResult<Option<Permission>>> + Send;

    /// Legacy lookup. (module, action) is not unique across features;
    /// ties are broken deterministically by lowest dotted name.
    fn find_by_module_action(
        &self,
        module: &str,
        action: &str,
    ) -> impl Future<Output = CiviamResult<Option<Permission>>> + Send;

    fn list_active(&self) -> impl Future<Output = CiviamResult<Vec<Permission>>> + Send;

    /// Toggle `is_active`. Deactivation removes the permission from
    /// resolution without deleting history.
    fn set_active(
        &self,
        name: &PermissionName,
        is_active: bool,
    ) -> impl Future<Output = CiviamResult<Permission>> + Send;
}

pub trait RolePermissionRepository: Send + Sync {
    fn exists(
        &self,
        role: Role,
        permission_id: Uuid,
    ) -> impl Future<Output = CiviamResult<bool>> + Send;

    fn list_for_role(&self, role: Role) -> impl Future<Output = CiviamResult<Vec<Permission>>> + Send;

    /// Replace the entire permission set for a role. Runs as a single
    /// transaction — readers never observe the half-synced state.
    fn replace_for_role(
        &self,
        role: Role,
        permission_ids: Vec<Uuid>,
    ) -> impl Future<Output = CiviamResult<()>> + Send;
}

pub trait CustomRoleRepository: Send + Sync {
    fn create(
        &self,
        input: CreateCustomRole,
    ) -> impl Future<Output = CiviamResult<CustomRole>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CiviamResult<CustomRole>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateCustomRole,
    ) -> impl Future<Output = CiviamResult<CustomRole>> + Send;

    /// Replace the role's permission bundle.
    fn set_permissions(
        &self,
        role_id: Uuid,
        permission_ids: Vec<Uuid>,
    ) -> impl Future<Output = CiviamResult<()>> + Send;

    fn assign_to_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = CiviamResult<()>> + Send;

    fn unassign_from_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = CiviamResult<()>> + Send;

    /// Whether any *active* custom role assigned to the user bundles
    /// the permission.
    fn active_grant_exists(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = CiviamResult<bool>> + Send;

    /// Union of the permission sets of the user's active custom roles.
    fn list_permissions_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CiviamResult<Vec<Permission>>> + Send;
}

pub trait UserPermissionRepository: Send + Sync {
    /// Append an override row. Fails with `NotFound` if the referenced
    /// permission does not exist. Never removes earlier rows for the
    /// same pair.
    fn insert(
        &self,
        input: CreateUserPermission,
    ) -> impl Future<Output = CiviamResult<UserPermission>> + Send;

    /// Every override row for the pair, whatever its type or expiry.
    fn overrides_for(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = CiviamResult<Vec<UserPermission>>> + Send;

    /// Grant rows whose `expires_at` is null or in the future.
    fn list_valid_grants(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CiviamResult<Vec<UserPermission>>> + Send;

    /// Permission ids with at least one revoke row for the user.
    fn list_revoked_ids(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CiviamResult<Vec<Uuid>>> + Send;

    /// Full override history for the user — audit view.
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CiviamResult<Vec<UserPermission>>> + Send;

    /// Delete every override row for the pair.
    fn delete_overrides(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = CiviamResult<()>> + Send;
}
