//! SurrealDB repository implementations.

mod custom_role;
mod permission;
mod role_permission;
mod user;
mod user_permission;

pub use custom_role::SurrealCustomRoleRepository;
pub use permission::SurrealPermissionRepository;
pub use role_permission::SurrealRolePermissionRepository;
pub use user::SurrealUserRepository;
pub use user_permission::SurrealUserPermissionRepository;
