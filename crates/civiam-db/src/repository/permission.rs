//! SurrealDB implementation of [`PermissionRepository`].

use chrono::{DateTime, Utc};
use civiam_core::error::CiviamResult;
use civiam_core::models::permission::{Permission, PermissionName, UpsertPermission};
use civiam_core::repository::PermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
pub(crate) struct PermissionRow {
    name: String,
    module: String,
    feature: Option<String>,
    action: String,
    display_name: String,
    category: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct PermissionRowWithId {
    record_id: String,
    name: String,
    module: String,
    feature: Option<String>,
    action: String,
    display_name: String,
    category: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self, id: Uuid) -> Result<Permission, DbError> {
        Ok(Permission {
            id,
            name: PermissionName::parse(self.name)
                .map_err(|e| DbError::Decode(e.to_string()))?,
            module: self.module,
            feature: self.feature,
            action: self.action,
            display_name: self.display_name,
            category: self.category,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PermissionRowWithId {
    pub(crate) fn try_into_permission(self) -> Result<Permission, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(Permission {
            id,
            name: PermissionName::parse(self.name)
                .map_err(|e| DbError::Decode(e.to_string()))?,
            module: self.module,
            feature: self.feature,
            action: self.action,
            display_name: self.display_name,
            category: self.category,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_row_by_name(
        &self,
        name: &PermissionName,
    ) -> Result<Option<PermissionRowWithId>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE name = $name",
            )
            .bind(("name", name.as_str().to_string()))
            .await?;

        let rows: Vec<PermissionRowWithId> = result.take(0)?;
        Ok(rows.into_iter().next())
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn upsert_many(&self, inputs: Vec<UpsertPermission>) -> CiviamResult<Vec<Permission>> {
        let mut upserted = Vec::with_capacity(inputs.len());

        for input in inputs {
            let feature = input.name.feature().map(str::to_string);

            let (id, query) = match self.find_row_by_name(&input.name).await? {
                Some(existing) => {
                    let id = Uuid::parse_str(&existing.record_id)
                        .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
                    // Existing rows keep their id and active flag.
                    let query = "UPDATE type::record('permission', $id) SET \
                         module = $module, feature = $feature, \
                         action = $action, display_name = $display_name, \
                         category = $category, updated_at = time::now()";
                    (id, query)
                }
                None => {
                    let query = "CREATE type::record('permission', $id) SET \
                         name = $name, module = $module, feature = $feature, \
                         action = $action, display_name = $display_name, \
                         category = $category, is_active = true";
                    (Uuid::new_v4(), query)
                }
            };

            let id_str = id.to_string();
            let result = self
                .db
                .query(query)
                .bind(("id", id_str.clone()))
                .bind(("name", input.name.as_str().to_string()))
                .bind(("module", input.name.module().to_string()))
                .bind(("feature", feature))
                .bind(("action", input.name.action().to_string()))
                .bind(("display_name", input.display_name))
                .bind(("category", input.category))
                .await
                .map_err(DbError::from)?;

            let mut result = result
                .check()
                .map_err(|e| DbError::Decode(e.to_string()))?;

            let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                entity: "permission".into(),
                id: id_str,
            })?;

            upserted.push(row.into_permission(id)?);
        }

        Ok(upserted)
    }

    async fn get_by_id(&self, id: Uuid) -> CiviamResult<Permission> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('permission', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: id_str,
        })?;

        Ok(row.into_permission(id)?)
    }

    async fn find_by_name(&self, name: &PermissionName) -> CiviamResult<Option<Permission>> {
        let row = self.find_row_by_name(name).await?;
        Ok(row.map(PermissionRowWithId::try_into_permission).transpose()?)
    }

    async fn find_by_module_action(
        &self,
        module: &str,
        action: &str,
    ) -> CiviamResult<Option<Permission>> {
        // (module, action) may match several features; lowest dotted
        // name wins so repeated lookups agree.
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE module = $module AND action = $action \
                 ORDER BY name ASC LIMIT 1",
            )
            .bind(("module", module.to_string()))
            .bind(("action", action.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(PermissionRowWithId::try_into_permission)
            .transpose()?)
    }

    async fn list_active(&self) -> CiviamResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE is_active = true ORDER BY name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let permissions = rows
            .into_iter()
            .map(PermissionRowWithId::try_into_permission)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }

    async fn set_active(&self, name: &PermissionName, is_active: bool) -> CiviamResult<Permission> {
        let mut result = self
            .db
            .query(
                "UPDATE permission SET is_active = $is_active, \
                 updated_at = time::now() WHERE name = $name",
            )
            .bind(("name", name.as_str().to_string()))
            .bind(("is_active", is_active))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "permission".into(),
                id: name.as_str().to_string(),
            }
            .into());
        }

        let row = self
            .find_row_by_name(name)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "permission".into(),
                id: name.as_str().to_string(),
            })?;

        Ok(row.try_into_permission()?)
    }
}
