//! SurrealDB implementation of [`UserPermissionRepository`].
//!
//! Overrides are an append-only log — insert never touches earlier
//! rows for the same (user, permission) pair.

use chrono::{DateTime, Utc};
use civiam_core::error::CiviamResult;
use civiam_core::models::user_permission::{CreateUserPermission, OverrideType, UserPermission};
use civiam_core::repository::UserPermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserPermissionRow {
    user_id: String,
    permission_id: String,
    override_type: String,
    reason: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    granted_by: Option<String>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserPermissionRowWithId {
    record_id: String,
    user_id: String,
    permission_id: String,
    override_type: String,
    reason: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    granted_by: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_override(s: &str) -> Result<OverrideType, DbError> {
    match s {
        "Grant" => Ok(OverrideType::Grant),
        "Revoke" => Ok(OverrideType::Revoke),
        other => Err(DbError::Decode(format!("unknown override type: {other}"))),
    }
}

fn override_to_string(t: OverrideType) -> &'static str {
    match t {
        OverrideType::Grant => "Grant",
        OverrideType::Revoke => "Revoke",
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))
}

impl UserPermissionRow {
    fn into_user_permission(self, id: Uuid) -> Result<UserPermission, DbError> {
        Ok(UserPermission {
            id,
            user_id: parse_uuid(&self.user_id)?,
            permission_id: parse_uuid(&self.permission_id)?,
            override_type: parse_override(&self.override_type)?,
            reason: self.reason,
            expires_at: self.expires_at,
            granted_by: self.granted_by.as_deref().map(parse_uuid).transpose()?,
            created_at: self.created_at,
        })
    }
}

impl UserPermissionRowWithId {
    fn try_into_user_permission(self) -> Result<UserPermission, DbError> {
        let id = parse_uuid(&self.record_id)?;
        Ok(UserPermission {
            id,
            user_id: parse_uuid(&self.user_id)?,
            permission_id: parse_uuid(&self.permission_id)?,
            override_type: parse_override(&self.override_type)?,
            reason: self.reason,
            expires_at: self.expires_at,
            granted_by: self.granted_by.as_deref().map(parse_uuid).transpose()?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the UserPermission override log.
#[derive(Clone)]
pub struct SurrealUserPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserPermissionRepository for SurrealUserPermissionRepository<C> {
    async fn insert(&self, input: CreateUserPermission) -> CiviamResult<UserPermission> {
        // Overrides reference permissions by id; reject dangling ids
        // here so the log never accumulates unresolvable rows.
        let perm_id_str = input.permission_id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM \
                 type::record('permission', $permission_id) GROUP ALL",
            )
            .bind(("permission_id", perm_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        if rows.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(DbError::NotFound {
                entity: "permission".into(),
                id: perm_id_str,
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user_permission', $id) SET \
                 user_id = $user_id, permission_id = $permission_id, \
                 override_type = $override_type, reason = $reason, \
                 expires_at = $expires_at, granted_by = $granted_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("permission_id", perm_id_str))
            .bind(("override_type", override_to_string(input.override_type)))
            .bind(("reason", input.reason))
            .bind(("expires_at", input.expires_at))
            .bind(("granted_by", input.granted_by.map(|u| u.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<UserPermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user_permission".into(),
            id: id_str,
        })?;

        Ok(row.into_user_permission(id)?)
    }

    async fn overrides_for(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> CiviamResult<Vec<UserPermission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_permission \
                 WHERE user_id = $user_id \
                 AND permission_id = $permission_id \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("permission_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserPermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let overrides = rows
            .into_iter()
            .map(UserPermissionRowWithId::try_into_user_permission)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(overrides)
    }

    async fn list_valid_grants(&self, user_id: Uuid) -> CiviamResult<Vec<UserPermission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_permission \
                 WHERE user_id = $user_id \
                 AND override_type = 'Grant' \
                 AND (expires_at IS NONE OR expires_at > time::now()) \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserPermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let grants = rows
            .into_iter()
            .map(UserPermissionRowWithId::try_into_user_permission)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(grants)
    }

    async fn list_revoked_ids(&self, user_id: Uuid) -> CiviamResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE permission_id FROM user_permission \
                 WHERE user_id = $user_id \
                 AND override_type = 'Revoke'",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let ids: Vec<String> = result.take(0).map_err(DbError::from)?;
        let ids = ids
            .iter()
            .map(|s| parse_uuid(s))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(ids)
    }

    async fn list_for_user(&self, user_id: Uuid) -> CiviamResult<Vec<UserPermission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user_permission \
                 WHERE user_id = $user_id \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserPermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let overrides = rows
            .into_iter()
            .map(UserPermissionRowWithId::try_into_user_permission)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(overrides)
    }

    async fn delete_overrides(&self, user_id: Uuid, permission_id: Uuid) -> CiviamResult<()> {
        self.db
            .query(
                "DELETE user_permission WHERE \
                 user_id = $user_id AND permission_id = $permission_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("permission_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
