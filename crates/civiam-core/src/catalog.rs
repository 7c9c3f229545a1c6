//! Seeded municipal permission catalog.
//!
//! The catalog is administered out-of-band: deployments run
//! `PermissionRepository::upsert_many(default_catalog())` at startup or
//! from a maintenance task. Upserting by name is idempotent, so the
//! catalog can be re-applied on every release.

use crate::models::permission::{PermissionName, UpsertPermission};

/// Functional areas of the platform.
pub mod modules {
    pub const FINANZAS: &str = "finanzas";
    pub const RRHH: &str = "rrhh";
    pub const TRIBUTOS: &str = "tributos";
    pub const PROYECTOS: &str = "proyectos";
    pub const FLOTA: &str = "flota";
    pub const ACTIVOS: &str = "activos";
    pub const PARTICIPACION: &str = "participacion";
    pub const ADMIN: &str = "admin";

    pub const ALL: [&str; 8] = [
        FINANZAS,
        RRHH,
        TRIBUTOS,
        PROYECTOS,
        FLOTA,
        ACTIVOS,
        PARTICIPACION,
        ADMIN,
    ];
}

/// Actions with platform-wide meaning.
pub mod actions {
    /// Module-level visibility.
    pub const READ: &str = "read";
    /// Module-level administration; implies visibility.
    pub const MANAGE: &str = "manage";
}

/// (name, display name, category) for every seeded permission.
const CATALOG: &[(&str, &str, &str)] = &[
    // Module visibility
    ("finanzas.read", "Ver módulo de finanzas", "Finanzas"),
    ("finanzas.manage", "Administrar módulo de finanzas", "Finanzas"),
    ("rrhh.read", "Ver módulo de recursos humanos", "Recursos Humanos"),
    ("rrhh.manage", "Administrar módulo de recursos humanos", "Recursos Humanos"),
    ("tributos.read", "Ver módulo de tributos", "Tributos"),
    ("tributos.manage", "Administrar módulo de tributos", "Tributos"),
    ("proyectos.read", "Ver módulo de proyectos", "Proyectos"),
    ("proyectos.manage", "Administrar módulo de proyectos", "Proyectos"),
    ("flota.read", "Ver módulo de flota", "Flota"),
    ("flota.manage", "Administrar módulo de flota", "Flota"),
    ("activos.read", "Ver módulo de activos", "Activos"),
    ("activos.manage", "Administrar módulo de activos", "Activos"),
    ("participacion.read", "Ver módulo de participación", "Participación"),
    ("participacion.manage", "Administrar módulo de participación", "Participación"),
    ("admin.read", "Ver módulo de administración", "Administración"),
    ("admin.manage", "Administrar la plataforma", "Administración"),
    // Finanzas
    ("finanzas.cajas_chicas.ver", "Ver cajas chicas", "Finanzas"),
    ("finanzas.cajas_chicas.crear", "Crear cajas chicas", "Finanzas"),
    ("finanzas.cajas_chicas.aprobar", "Aprobar cajas chicas", "Finanzas"),
    ("finanzas.anticipos.ver", "Ver anticipos", "Finanzas"),
    ("finanzas.anticipos.aprobar", "Aprobar anticipos", "Finanzas"),
    ("finanzas.anticipos.descontar", "Descontar anticipos en nómina", "Finanzas"),
    ("finanzas.presupuesto.ver", "Ver presupuesto", "Finanzas"),
    ("finanzas.presupuesto.editar", "Editar presupuesto", "Finanzas"),
    ("finanzas.reportes.exportar", "Exportar reportes financieros", "Finanzas"),
    // Recursos Humanos
    ("rrhh.empleados.ver", "Ver empleados", "Recursos Humanos"),
    ("rrhh.empleados.crear", "Crear empleados", "Recursos Humanos"),
    ("rrhh.empleados.editar", "Editar empleados", "Recursos Humanos"),
    ("rrhh.nomina.ver", "Ver nómina", "Recursos Humanos"),
    ("rrhh.nomina.procesar", "Procesar nómina", "Recursos Humanos"),
    ("rrhh.vacaciones.aprobar", "Aprobar vacaciones", "Recursos Humanos"),
    // Tributos
    ("tributos.contribuyentes.ver", "Ver contribuyentes", "Tributos"),
    ("tributos.contribuyentes.editar", "Editar contribuyentes", "Tributos"),
    ("tributos.cobros.registrar", "Registrar cobros", "Tributos"),
    ("tributos.exoneraciones.aprobar", "Aprobar exoneraciones", "Tributos"),
    // Proyectos
    ("proyectos.obras.ver", "Ver obras", "Proyectos"),
    ("proyectos.obras.crear", "Crear obras", "Proyectos"),
    ("proyectos.avances.registrar", "Registrar avances de obra", "Proyectos"),
    // Flota
    ("flota.vehiculos.ver", "Ver vehículos", "Flota"),
    ("flota.vehiculos.asignar", "Asignar vehículos", "Flota"),
    ("flota.mantenimientos.registrar", "Registrar mantenimientos", "Flota"),
    ("flota.combustible.aprobar", "Aprobar vales de combustible", "Flota"),
    // Activos
    ("activos.inventario.ver", "Ver inventario de activos", "Activos"),
    ("activos.inventario.editar", "Editar inventario de activos", "Activos"),
    ("activos.bajas.aprobar", "Aprobar bajas de activos", "Activos"),
    // Participación ciudadana
    ("participacion.solicitudes.ver", "Ver solicitudes ciudadanas", "Participación"),
    ("participacion.solicitudes.responder", "Responder solicitudes ciudadanas", "Participación"),
    ("participacion.denuncias.gestionar", "Gestionar denuncias", "Participación"),
    // Administración
    ("admin.usuarios.ver", "Ver usuarios", "Administración"),
    ("admin.usuarios.crear", "Crear usuarios", "Administración"),
    ("admin.usuarios.editar", "Editar usuarios", "Administración"),
    ("admin.permisos.gestionar", "Gestionar permisos y roles", "Administración"),
    ("admin.auditoria.ver", "Ver registros de auditoría", "Administración"),
];

/// The full seeded capability set, ready for `upsert_many`.
pub fn default_catalog() -> Vec<UpsertPermission> {
    CATALOG
        .iter()
        .map(|(name, display_name, category)| UpsertPermission {
            name: PermissionName::parse(*name).expect("catalog name is valid"),
            display_name: (*display_name).to_string(),
            category: (*category).to_string(),
        })
        .collect()
}
