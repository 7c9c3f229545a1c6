//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['SuperAdmin', 'Admin', 'Director', 'Coordinator', \
    'Employee', 'Auditor'];
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Permissions (catalog, upserted by name)
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD name ON TABLE permission TYPE string;
DEFINE FIELD module ON TABLE permission TYPE string;
DEFINE FIELD feature ON TABLE permission TYPE option<string>;
DEFINE FIELD action ON TABLE permission TYPE string;
DEFINE FIELD display_name ON TABLE permission TYPE string;
DEFINE FIELD category ON TABLE permission TYPE string;
DEFINE FIELD is_active ON TABLE permission TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_name ON TABLE permission \
    COLUMNS name UNIQUE;
-- (module, action) is deliberately NOT unique: the same action may
-- exist under several features of one module.
DEFINE INDEX idx_permission_module_action ON TABLE permission \
    COLUMNS module, action;

-- =======================================================================
-- Role baseline permission sets (role is a fixed enum, not a record)
-- =======================================================================
DEFINE TABLE role_permission SCHEMAFULL;
DEFINE FIELD role ON TABLE role_permission TYPE string \
    ASSERT $value IN ['SuperAdmin', 'Admin', 'Director', 'Coordinator', \
    'Employee', 'Auditor'];
DEFINE FIELD permission_id ON TABLE role_permission TYPE string;
DEFINE FIELD created_at ON TABLE role_permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_permission ON TABLE role_permission \
    COLUMNS role, permission_id UNIQUE;

-- =======================================================================
-- Custom roles (admin-defined permission bundles)
-- =======================================================================
DEFINE TABLE custom_role SCHEMAFULL;
DEFINE FIELD name ON TABLE custom_role TYPE string;
DEFINE FIELD description ON TABLE custom_role TYPE string;
DEFINE FIELD is_active ON TABLE custom_role TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE custom_role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE custom_role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_custom_role_name ON TABLE custom_role \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Per-user exceptional overrides (append-only log)
-- =======================================================================
DEFINE TABLE user_permission SCHEMAFULL;
DEFINE FIELD user_id ON TABLE user_permission TYPE string;
DEFINE FIELD permission_id ON TABLE user_permission TYPE string;
DEFINE FIELD override_type ON TABLE user_permission TYPE string \
    ASSERT $value IN ['Grant', 'Revoke'];
DEFINE FIELD reason ON TABLE user_permission TYPE option<string>;
DEFINE FIELD expires_at ON TABLE user_permission TYPE option<datetime>;
DEFINE FIELD granted_by ON TABLE user_permission TYPE option<string>;
DEFINE FIELD created_at ON TABLE user_permission TYPE datetime \
    DEFAULT time::now();
-- Non-unique: grant/revoke history accumulates per pair.
DEFINE INDEX idx_user_permission_pair ON TABLE user_permission \
    COLUMNS user_id, permission_id;
DEFINE INDEX idx_user_permission_user ON TABLE user_permission \
    COLUMNS user_id;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- CustomRole -> Permission bundle membership
DEFINE TABLE bundles TYPE RELATION SCHEMAFULL;

-- User -> CustomRole assignment
DEFINE TABLE holds_role TYPE RELATION SCHEMAFULL;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_covers_every_fixed_role() {
        use civiam_core::models::role::Role;
        for role in Role::ALL {
            assert!(
                SCHEMA_V1.contains(role.as_str()),
                "role {role} missing from schema ASSERT list"
            );
        }
    }
}
