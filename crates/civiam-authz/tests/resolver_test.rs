//! Integration tests for permission resolution.
//!
//! Each test spins up an in-memory SurrealDB, runs migrations, and
//! drives the resolver through the full stack of Surreal repositories.

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use civiam_authz::{PermissionCheck, PermissionMap, PermissionResolver};
use civiam_core::models::custom_role::{CreateCustomRole, UpdateCustomRole};
use civiam_core::models::permission::{Permission, PermissionName, UpsertPermission};
use civiam_core::models::role::Role;
use civiam_core::models::user::{CreateUser, UpdateUser};
use civiam_core::models::user_permission::OverrideType;
use civiam_core::repository::{CustomRoleRepository, PermissionRepository, UserRepository};
use civiam_db::repository::{
    SurrealCustomRoleRepository, SurrealPermissionRepository, SurrealRolePermissionRepository,
    SurrealUserPermissionRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

type Resolver = PermissionResolver<
    SurrealUserRepository<Db>,
    SurrealPermissionRepository<Db>,
    SurrealRolePermissionRepository<Db>,
    SurrealCustomRoleRepository<Db>,
    SurrealUserPermissionRepository<Db>,
>;

async fn setup() -> (Surreal<Db>, Resolver) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    civiam_db::run_migrations(&db).await.unwrap();

    let resolver = PermissionResolver::new(
        SurrealUserRepository::new(db.clone()),
        SurrealPermissionRepository::new(db.clone()),
        SurrealRolePermissionRepository::new(db.clone()),
        SurrealCustomRoleRepository::new(db.clone()),
        SurrealUserPermissionRepository::new(db.clone()),
    );

    (db, resolver)
}

async fn create_user(db: &Surreal<Db>, username: &str, role: Role) -> Uuid {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            username: username.into(),
            email: format!("{username}@municipio.gob"),
            role,
        })
        .await
        .unwrap()
        .id
}

async fn deactivate_user(db: &Surreal<Db>, user_id: Uuid) {
    SurrealUserRepository::new(db.clone())
        .update(
            user_id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

async fn seed(db: &Surreal<Db>, names: &[&str]) -> Vec<Permission> {
    SurrealPermissionRepository::new(db.clone())
        .upsert_many(
            names
                .iter()
                .map(|name| UpsertPermission {
                    name: PermissionName::parse(*name).unwrap(),
                    display_name: (*name).into(),
                    category: "Test".into(),
                })
                .collect(),
        )
        .await
        .unwrap()
}

fn check(name: &str) -> PermissionCheck {
    PermissionCheck::name(name).unwrap()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Baseline resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn role_baseline_allows_and_unrelated_denies() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["rrhh.empleados.ver", "admin.usuarios.crear"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;

    resolver
        .sync_role_permissions(Role::Employee, vec![perms[0].id])
        .await
        .unwrap();

    assert!(resolver.has_permission(user, &check("rrhh.empleados.ver")).await);
    assert!(!resolver.has_permission(user, &check("admin.usuarios.crear")).await);
}

#[tokio::test]
async fn legacy_module_action_form_resolves() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["rrhh.empleados.ver"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;

    resolver
        .sync_role_permissions(Role::Employee, vec![perms[0].id])
        .await
        .unwrap();

    let pair = PermissionCheck::module_action("rrhh", "ver");
    assert!(resolver.has_permission(user, &pair).await);
    assert!(
        !resolver
            .has_permission(user, &PermissionCheck::module_action("rrhh", "crear"))
            .await
    );
}

#[tokio::test]
async fn unknown_permission_denies() {
    let (db, resolver) = setup().await;
    let user = create_user(&db, "jperez", Role::Admin).await;

    assert!(!resolver.has_permission(user, &check("fantasma.modulo.ver")).await);
}

#[tokio::test]
async fn unknown_user_denies() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["rrhh.empleados.ver"]).await;
    resolver
        .sync_role_permissions(Role::Employee, vec![perms[0].id])
        .await
        .unwrap();

    assert!(
        !resolver
            .has_permission(Uuid::new_v4(), &check("rrhh.empleados.ver"))
            .await
    );
}

#[tokio::test]
async fn deactivated_permission_denies() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["flota.vehiculos.asignar"]).await;
    let user = create_user(&db, "jperez", Role::Coordinator).await;

    resolver
        .sync_role_permissions(Role::Coordinator, vec![perms[0].id])
        .await
        .unwrap();
    assert!(resolver.has_permission(user, &check("flota.vehiculos.asignar")).await);

    SurrealPermissionRepository::new(db.clone())
        .set_active(&perms[0].name, false)
        .await
        .unwrap();

    assert!(!resolver.has_permission(user, &check("flota.vehiculos.asignar")).await);
}

// ---------------------------------------------------------------------------
// Property 1 — revoke dominance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revoke_beats_role_grant() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["finanzas.cajas_chicas.aprobar"]).await;
    let user = create_user(&db, "mlopez", Role::Coordinator).await;

    resolver
        .sync_role_permissions(Role::Coordinator, vec![perms[0].id])
        .await
        .unwrap();
    assert!(resolver.has_permission(user, &check("finanzas.cajas_chicas.aprobar")).await);

    resolver
        .revoke_permission(user, perms[0].id, Some("investigación en curso".into()))
        .await
        .unwrap();

    assert!(!resolver.has_permission(user, &check("finanzas.cajas_chicas.aprobar")).await);
}

#[tokio::test]
async fn revoke_beats_grant_inserted_afterwards() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["finanzas.presupuesto.editar"]).await;
    let user = create_user(&db, "mlopez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    resolver.revoke_permission(user, perms[0].id, None).await.unwrap();
    // A later grant must not shadow the standing revoke.
    resolver
        .grant_permission(user, perms[0].id, admin, None, None)
        .await
        .unwrap();

    assert!(!resolver.has_permission(user, &check("finanzas.presupuesto.editar")).await);
}

#[tokio::test]
async fn revoke_beats_custom_role_bundle() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["tributos.exoneraciones.aprobar"]).await;
    let user = create_user(&db, "mlopez", Role::Employee).await;

    let custom_repo = SurrealCustomRoleRepository::new(db.clone());
    let bundle = custom_repo
        .create(CreateCustomRole {
            name: "aprobador-tributos".into(),
            description: "".into(),
        })
        .await
        .unwrap();
    custom_repo.set_permissions(bundle.id, vec![perms[0].id]).await.unwrap();
    custom_repo.assign_to_user(user, bundle.id).await.unwrap();
    assert!(resolver.has_permission(user, &check("tributos.exoneraciones.aprobar")).await);

    resolver.revoke_permission(user, perms[0].id, None).await.unwrap();
    assert!(!resolver.has_permission(user, &check("tributos.exoneraciones.aprobar")).await);
}

// ---------------------------------------------------------------------------
// Property 2 — grant expiry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_grant_denies() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["finanzas.anticipos.descontar"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    resolver
        .grant_permission(
            user,
            perms[0].id,
            admin,
            Some("cobertura".into()),
            Some(Utc::now() - Duration::days(1)),
        )
        .await
        .unwrap();

    assert!(!resolver.has_permission(user, &check("finanzas.anticipos.descontar")).await);
}

#[tokio::test]
async fn permanent_grant_allows() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["finanzas.anticipos.descontar"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    resolver
        .grant_permission(user, perms[0].id, admin, None, None)
        .await
        .unwrap();

    assert!(resolver.has_permission(user, &check("finanzas.anticipos.descontar")).await);
}

#[tokio::test]
async fn future_expiry_grant_allows() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["flota.combustible.aprobar"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    resolver
        .grant_permission(user, perms[0].id, admin, None, Some(Utc::now() + Duration::days(7)))
        .await
        .unwrap();

    assert!(resolver.has_permission(user, &check("flota.combustible.aprobar")).await);
}

// ---------------------------------------------------------------------------
// Property 3 — super admin bypass
// ---------------------------------------------------------------------------

#[tokio::test]
async fn super_admin_bypasses_everything() {
    let (db, resolver) = setup().await;
    seed(&db, &["rrhh.empleados.ver"]).await;
    let root = create_user(&db, "root", Role::SuperAdmin).await;

    // Seeded, unseeded, and legacy-form capabilities all resolve true.
    assert!(resolver.has_permission(root, &check("rrhh.empleados.ver")).await);
    assert!(resolver.has_permission(root, &check("no.existe.jamas")).await);
    assert!(
        resolver
            .has_permission(root, &PermissionCheck::module_action("fantasma", "ver"))
            .await
    );
}

#[tokio::test]
async fn revoke_against_super_admin_is_inert() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["admin.permisos.gestionar"]).await;
    let root = create_user(&db, "root", Role::SuperAdmin).await;

    resolver.revoke_permission(root, perms[0].id, None).await.unwrap();

    // Bypass is evaluated before the override lookup.
    assert!(resolver.has_permission(root, &check("admin.permisos.gestionar")).await);
}

// ---------------------------------------------------------------------------
// Property 4 — inactive users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inactive_user_denies_everything() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["rrhh.empleados.ver"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    resolver
        .sync_role_permissions(Role::Employee, vec![perms[0].id])
        .await
        .unwrap();
    resolver.grant_permission(user, perms[0].id, admin, None, None).await.unwrap();

    deactivate_user(&db, user).await;

    assert!(!resolver.has_permission(user, &check("rrhh.empleados.ver")).await);
    assert!(resolver.user_permission_map(user).await.is_empty());
}

#[tokio::test]
async fn inactive_super_admin_denies() {
    let (db, resolver) = setup().await;
    seed(&db, &["rrhh.empleados.ver"]).await;
    let root = create_user(&db, "root", Role::SuperAdmin).await;

    deactivate_user(&db, root).await;

    assert!(!resolver.has_permission(root, &check("rrhh.empleados.ver")).await);
}

// ---------------------------------------------------------------------------
// Property 5 — aggregation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn permission_map_is_union_minus_revokes() {
    let (db, resolver) = setup().await;
    let perms = seed(
        &db,
        &[
            "rrhh.empleados.ver",
            "rrhh.read",
            "finanzas.cajas_chicas.aprobar",
            "flota.vehiculos.ver",
        ],
    )
    .await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    // Role baseline: rrhh.empleados.ver + rrhh.read.
    resolver
        .sync_role_permissions(Role::Employee, vec![perms[0].id, perms[1].id])
        .await
        .unwrap();

    // Custom role bundle: finanzas.cajas_chicas.aprobar.
    let custom_repo = SurrealCustomRoleRepository::new(db.clone());
    let bundle = custom_repo
        .create(CreateCustomRole {
            name: "aprobador".into(),
            description: "".into(),
        })
        .await
        .unwrap();
    custom_repo.set_permissions(bundle.id, vec![perms[2].id]).await.unwrap();
    custom_repo.assign_to_user(user, bundle.id).await.unwrap();

    // Exceptional grant: flota.vehiculos.ver. Revoke: rrhh.empleados.ver.
    resolver.grant_permission(user, perms[3].id, admin, None, None).await.unwrap();
    resolver.revoke_permission(user, perms[0].id, None).await.unwrap();

    let map = resolver.user_permission_map(user).await;

    let mut expected = PermissionMap::new();
    expected.insert("rrhh".into(), set(&["rrhh.read", "read"]));
    expected.insert(
        "finanzas".into(),
        set(&["finanzas.cajas_chicas.aprobar", "aprobar"]),
    );
    expected.insert("flota".into(), set(&["flota.vehiculos.ver", "ver"]));
    assert_eq!(map, expected);

    // Enforcement agrees with the aggregate.
    assert!(!resolver.has_permission(user, &check("rrhh.empleados.ver")).await);
    assert!(resolver.has_permission(user, &check("rrhh.read")).await);
}

#[tokio::test]
async fn permission_map_excludes_expired_grants_and_inactive_permissions() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["flota.vehiculos.ver", "flota.vehiculos.asignar"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    resolver
        .grant_permission(user, perms[0].id, admin, None, Some(Utc::now() - Duration::hours(1)))
        .await
        .unwrap();

    resolver
        .sync_role_permissions(Role::Employee, vec![perms[1].id])
        .await
        .unwrap();
    SurrealPermissionRepository::new(db.clone())
        .set_active(&perms[1].name, false)
        .await
        .unwrap();

    assert!(resolver.user_permission_map(user).await.is_empty());
}

#[tokio::test]
async fn permission_map_for_super_admin_lists_every_active_permission() {
    let (db, resolver) = setup().await;
    let perms = seed(
        &db,
        &["rrhh.empleados.ver", "finanzas.presupuesto.ver", "finanzas.presupuesto.editar"],
    )
    .await;
    let root = create_user(&db, "root", Role::SuperAdmin).await;

    // Deactivated rows stay out even for the super admin.
    SurrealPermissionRepository::new(db.clone())
        .set_active(&perms[0].name, false)
        .await
        .unwrap();

    let map = resolver.user_permission_map(root).await;

    let mut expected = PermissionMap::new();
    expected.insert(
        "finanzas".into(),
        set(&[
            "finanzas.presupuesto.ver",
            "finanzas.presupuesto.editar",
            "ver",
            "editar",
        ]),
    );
    assert_eq!(map, expected);
}

#[tokio::test]
async fn permission_map_empty_for_missing_user() {
    let (_db, resolver) = setup().await;
    assert!(resolver.user_permission_map(Uuid::new_v4()).await.is_empty());
}

// ---------------------------------------------------------------------------
// Property 6 — combinator laws
// ---------------------------------------------------------------------------

#[tokio::test]
async fn combinators_match_individual_checks() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["rrhh.empleados.ver", "admin.usuarios.crear"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;

    resolver
        .sync_role_permissions(Role::Employee, vec![perms[0].id])
        .await
        .unwrap();

    let held = check("rrhh.empleados.ver");
    let lacking = check("admin.usuarios.crear");

    let a = resolver.has_permission(user, &held).await;
    let b = resolver.has_permission(user, &lacking).await;
    assert!(a && !b);

    assert_eq!(
        resolver.has_any_permission(user, &[held.clone(), lacking.clone()]).await,
        a || b
    );
    assert_eq!(
        resolver.has_all_permissions(user, &[held.clone(), lacking.clone()]).await,
        a && b
    );
    assert!(resolver.has_any_permission(user, &[held.clone()]).await);
    assert!(resolver.has_all_permissions(user, &[held]).await);
    assert!(!resolver.has_any_permission(user, &[lacking.clone()]).await);
    assert!(!resolver.has_all_permissions(user, &[lacking]).await);

    // Vacuous truth for the empty AND; empty OR denies.
    assert!(resolver.has_all_permissions(user, &[]).await);
    assert!(!resolver.has_any_permission(user, &[]).await);
}

// ---------------------------------------------------------------------------
// Property 7 — role sync replace semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sync_replaces_entire_role_set() {
    let (db, resolver) = setup().await;
    let perms = seed(
        &db,
        &["finanzas.presupuesto.ver", "finanzas.presupuesto.editar", "rrhh.nomina.ver"],
    )
    .await;

    resolver
        .sync_role_permissions(Role::Director, vec![perms[0].id, perms[1].id])
        .await
        .unwrap();
    let ids: Vec<Uuid> = resolver
        .get_role_permissions(Role::Director)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&perms[0].id) && ids.contains(&perms[1].id));

    resolver
        .sync_role_permissions(Role::Director, vec![perms[2].id])
        .await
        .unwrap();
    let after: Vec<Uuid> = resolver
        .get_role_permissions(Role::Director)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(after, vec![perms[2].id]);

    // Sync to empty clears the baseline entirely.
    resolver.sync_role_permissions(Role::Director, vec![]).await.unwrap();
    assert!(resolver.get_role_permissions(Role::Director).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Property 8 — module access sugar
// ---------------------------------------------------------------------------

#[tokio::test]
async fn module_access_equals_read_or_manage() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["finanzas.read", "finanzas.manage", "rrhh.read"]).await;

    let reader = create_user(&db, "reader", Role::Employee).await;
    let manager = create_user(&db, "manager", Role::Director).await;
    let outsider = create_user(&db, "outsider", Role::Auditor).await;

    resolver
        .sync_role_permissions(Role::Employee, vec![perms[0].id])
        .await
        .unwrap();
    resolver
        .sync_role_permissions(Role::Director, vec![perms[1].id])
        .await
        .unwrap();

    for user in [reader, manager, outsider] {
        for module in ["finanzas", "rrhh"] {
            let read = PermissionCheck::module_action(module, "read");
            let manage = PermissionCheck::module_action(module, "manage");
            let expected = resolver.has_permission(user, &read).await
                || resolver.has_permission(user, &manage).await;
            assert_eq!(
                resolver.can_access_module(user, module).await,
                expected,
                "sugar mismatch for module {module}"
            );
        }
    }

    assert!(resolver.can_access_module(reader, "finanzas").await);
    assert!(resolver.can_access_module(manager, "finanzas").await);
    assert!(!resolver.can_access_module(outsider, "finanzas").await);
    assert!(!resolver.can_access_module(reader, "rrhh").await);
}

// ---------------------------------------------------------------------------
// Custom roles at the resolution level
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deactivated_custom_role_stops_contributing() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["proyectos.obras.crear"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;

    let custom_repo = SurrealCustomRoleRepository::new(db.clone());
    let bundle = custom_repo
        .create(CreateCustomRole {
            name: "obras".into(),
            description: "".into(),
        })
        .await
        .unwrap();
    custom_repo.set_permissions(bundle.id, vec![perms[0].id]).await.unwrap();
    custom_repo.assign_to_user(user, bundle.id).await.unwrap();
    assert!(resolver.has_permission(user, &check("proyectos.obras.crear")).await);

    custom_repo
        .update(
            bundle.id,
            UpdateCustomRole {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!resolver.has_permission(user, &check("proyectos.obras.crear")).await);
}

// ---------------------------------------------------------------------------
// Administrative mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remove_user_permission_restores_baseline() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["rrhh.vacaciones.aprobar"]).await;
    let user = create_user(&db, "jperez", Role::Coordinator).await;

    resolver
        .sync_role_permissions(Role::Coordinator, vec![perms[0].id])
        .await
        .unwrap();

    resolver.revoke_permission(user, perms[0].id, None).await.unwrap();
    assert!(!resolver.has_permission(user, &check("rrhh.vacaciones.aprobar")).await);

    // Dropping the override log for the pair falls back to the role.
    resolver.remove_user_permission(user, perms[0].id).await.unwrap();
    assert!(resolver.has_permission(user, &check("rrhh.vacaciones.aprobar")).await);
}

#[tokio::test]
async fn remove_user_permission_also_drops_grants() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["tributos.cobros.registrar"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    resolver.grant_permission(user, perms[0].id, admin, None, None).await.unwrap();
    assert!(resolver.has_permission(user, &check("tributos.cobros.registrar")).await);

    resolver.remove_user_permission(user, perms[0].id).await.unwrap();
    assert!(!resolver.has_permission(user, &check("tributos.cobros.registrar")).await);
}

#[tokio::test]
async fn grant_with_unknown_permission_id_errors() {
    let (db, resolver) = setup().await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    // Mutation paths propagate failures, unlike the read paths.
    let result = resolver
        .grant_permission(user, Uuid::new_v4(), admin, None, None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn override_history_is_auditable() {
    let (db, resolver) = setup().await;
    let perms = seed(&db, &["activos.bajas.aprobar"]).await;
    let user = create_user(&db, "jperez", Role::Employee).await;
    let admin = create_user(&db, "admin", Role::Admin).await;

    resolver
        .grant_permission(
            user,
            perms[0].id,
            admin,
            Some("suplencia".into()),
            Some(Utc::now() - Duration::days(1)),
        )
        .await
        .unwrap();
    resolver
        .revoke_permission(user, perms[0].id, Some("fin de suplencia".into()))
        .await
        .unwrap();

    let history = resolver.list_user_overrides(user).await.unwrap();
    assert_eq!(history.len(), 2, "expired rows stay for audit");
    assert_eq!(history[0].override_type, OverrideType::Grant);
    assert_eq!(history[0].granted_by, Some(admin));
    assert_eq!(history[1].override_type, OverrideType::Revoke);
    assert_eq!(history[1].reason.as_deref(), Some("fin de suplencia"));
}
