//! SurrealDB implementation of [`CustomRoleRepository`].
//!
//! Bundle membership and user assignment are graph edges:
//! `custom_role -> bundles -> permission` and
//! `user -> holds_role -> custom_role`.

use chrono::{DateTime, Utc};
use civiam_core::error::CiviamResult;
use civiam_core::models::custom_role::{CreateCustomRole, CustomRole, UpdateCustomRole};
use civiam_core::models::permission::Permission;
use civiam_core::repository::CustomRoleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::permission::PermissionRowWithId;

#[derive(Debug, SurrealValue)]
struct CustomRoleRow {
    name: String,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomRoleRow {
    fn into_custom_role(self, id: Uuid) -> CustomRole {
        CustomRole {
            id,
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the CustomRole repository.
#[derive(Clone)]
pub struct SurrealCustomRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCustomRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CustomRoleRepository for SurrealCustomRoleRepository<C> {
    async fn create(&self, input: CreateCustomRole) -> CiviamResult<CustomRole> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('custom_role', $id) SET \
                 name = $name, description = $description, \
                 is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<CustomRoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "custom_role".into(),
            id: id_str,
        })?;

        Ok(row.into_custom_role(id))
    }

    async fn get_by_id(&self, id: Uuid) -> CiviamResult<CustomRole> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('custom_role', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CustomRoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "custom_role".into(),
            id: id_str,
        })?;

        Ok(row.into_custom_role(id))
    }

    async fn update(&self, id: Uuid, input: UpdateCustomRole) -> CiviamResult<CustomRole> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('custom_role', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<CustomRoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "custom_role".into(),
            id: id_str,
        })?;

        Ok(row.into_custom_role(id))
    }

    async fn set_permissions(&self, role_id: Uuid, permission_ids: Vec<Uuid>) -> CiviamResult<()> {
        let ids: Vec<String> = permission_ids.iter().map(Uuid::to_string).collect();

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE bundles WHERE in = type::record('custom_role', $role_id); \
                 FOR $pid IN $ids { \
                     RELATE (type::record('custom_role', $role_id)) \
                     -> bundles -> (type::record('permission', $pid)); \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(())
    }

    async fn assign_to_user(&self, user_id: Uuid, role_id: Uuid) -> CiviamResult<()> {
        self.db
            .query(
                "RELATE (type::record('user', $user_id)) \
                 -> holds_role -> (type::record('custom_role', $role_id))",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn unassign_from_user(&self, user_id: Uuid, role_id: Uuid) -> CiviamResult<()> {
        self.db
            .query(
                "DELETE holds_role WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('custom_role', $role_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn active_grant_exists(&self, user_id: Uuid, permission_id: Uuid) -> CiviamResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM bundles \
                 WHERE out = type::record('permission', $permission_id) \
                 AND in.is_active = true \
                 AND in IN (\
                     SELECT VALUE out FROM holds_role \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 GROUP ALL",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("permission_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn list_permissions_for_user(&self, user_id: Uuid) -> CiviamResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE is_active = true \
                 AND id IN (\
                     SELECT VALUE out FROM bundles \
                     WHERE in.is_active = true \
                     AND in IN (\
                         SELECT VALUE out FROM holds_role \
                         WHERE in = type::record('user', $user_id)\
                     )\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let permissions = rows
            .into_iter()
            .map(PermissionRowWithId::try_into_permission)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }
}
