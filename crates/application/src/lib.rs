//! Application services and ports.

#![forbid(unsafe_code)]

mod access_admin_service;
mod access_ports;
mod audit;
mod authorization_service;

pub use access_admin_service::{AccessAdminService, AssignmentPolicy};
pub use access_ports::{
    AssignRoleInput, AssignmentInsert, AssignmentRepository, BatchAction, BatchFailure, BatchPair,
    BatchRoleInput, BatchRoleOutcome, CacheInvalidationListener, CreatePermissionInput,
    CreateRoleInput, MutationEvent, MutationListener, PermissionCheckCache, PermissionRepository,
    RegisterUserInput, RoleRepository, UserRepository,
};
pub use audit::{AuditEvent, AuditRepository};
pub use authorization_service::AuthorizationService;
