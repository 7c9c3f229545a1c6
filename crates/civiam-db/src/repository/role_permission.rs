//! SurrealDB implementation of [`RolePermissionRepository`].

use civiam_core::error::CiviamResult;
use civiam_core::models::permission::Permission;
use civiam_core::models::role::Role;
use civiam_core::repository::RolePermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::permission::PermissionRowWithId;

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the role baseline permission sets.
#[derive(Clone)]
pub struct SurrealRolePermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRolePermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RolePermissionRepository for SurrealRolePermissionRepository<C> {
    async fn exists(&self, role: Role, permission_id: Uuid) -> CiviamResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM role_permission \
                 WHERE role = $role AND permission_id = $permission_id \
                 GROUP ALL",
            )
            .bind(("role", role.as_str()))
            .bind(("permission_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn list_for_role(&self, role: Role) -> CiviamResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE id IN (\
                     SELECT VALUE type::record('permission', permission_id) \
                     FROM role_permission WHERE role = $role\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("role", role.as_str()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let permissions = rows
            .into_iter()
            .map(PermissionRowWithId::try_into_permission)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }

    async fn replace_for_role(&self, role: Role, permission_ids: Vec<Uuid>) -> CiviamResult<()> {
        let ids: Vec<String> = permission_ids.iter().map(Uuid::to_string).collect();

        // Delete + re-insert as one transaction so concurrent readers
        // never observe the half-synced state.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE role_permission WHERE role = $role; \
                 FOR $pid IN $ids { \
                     CREATE role_permission SET role = $role, \
                     permission_id = $pid; \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("role", role.as_str()))
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(())
    }
}
